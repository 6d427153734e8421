//! A cheap byte-scan prefilter consulted at the automaton's start state to
//! skip regions that cannot possibly contain a match (spec.md §4.2, "C2").
//!
//! Two kinds compete for the role: a **start-byte** prefilter (every pattern
//! begins with one of a handful of distinct bytes) and a **rare-byte**
//! prefilter (every pattern contains, somewhere, one of a handful of bytes
//! chosen to be unlikely in typical input). Exactly one, or neither, is
//! selected at compile time; the contract both must uphold is that they
//! never produce a false negative (spec.md §8, property 3).

pub mod freq;

/// Floor on the number of samples collected before the effectiveness ratio
/// is trusted (spec.md §4.2).
const EFFECTIVENESS_FLOOR: u32 = 40;

/// A selected prefilter, ready to be consulted during a scan.
#[derive(Debug, Clone)]
pub enum Prefilter {
    /// Scan for the next occurrence of any of these bytes; any real match
    /// must begin exactly there.
    StartByte(Vec<u8>),
    /// Scan for the next occurrence of any of these bytes, then rewind by
    /// each byte's recorded maximum interior offset to the earliest position
    /// a match containing it could have started.
    RareByte {
        bytes: Vec<u8>,
        offsets: [u8; 256],
    },
}

impl Prefilter {
    /// Find the next plausible match start at or after `at`. Never skips
    /// past an actual match start (spec.md §4.2's non-masking invariant).
    pub fn next_candidate(&self, haystack: &[u8], at: usize) -> Option<usize> {
        match self {
            Prefilter::StartByte(bytes) => {
                find_any(haystack, at, bytes)
            }
            Prefilter::RareByte { bytes, offsets } => {
                let p = find_any(haystack, at, bytes)?;
                let b = haystack[p];
                let back = offsets[b as usize] as usize;
                Some(at.max(p.saturating_sub(back)))
            }
        }
    }
}

fn find_any(haystack: &[u8], at: usize, bytes: &[u8]) -> Option<usize> {
    haystack[at.min(haystack.len())..]
        .iter()
        .position(|b| bytes.contains(b))
        .map(|i| at + i)
}

/// Accumulates candidate start bytes across all patterns added at compile
/// time.
#[derive(Debug, Default)]
struct StartByteBuilder {
    bytes: Vec<u8>,
}

impl StartByteBuilder {
    fn add(&mut self, pattern: &[u8]) {
        if self.bytes.len() > 3 {
            return;
        }

        if let Some(&b) = pattern.first() {
            if b < 0x80 && !self.bytes.contains(&b) {
                self.bytes.push(b);
            }
        }
    }

    fn eligible(&self) -> bool {
        !self.bytes.is_empty() && self.bytes.len() <= 3
    }

    fn rank_sum(&self) -> u32 {
        self.bytes.iter().map(|&b| freq::rank(b) as u32).sum()
    }
}

/// Accumulates, for each pattern, the single rarest byte it contains along
/// with the maximum offset at which any rare byte has been seen from the
/// start of a pattern (so the scanner knows how far to rewind).
#[derive(Debug)]
struct RareByteBuilder {
    bytes: Vec<u8>,
    offsets: [u8; 256],
    available: bool,
}

impl Default for RareByteBuilder {
    fn default() -> Self {
        RareByteBuilder {
            bytes: Vec::new(),
            offsets: [0u8; 256],
            available: true,
        }
    }
}

impl RareByteBuilder {
    fn add(&mut self, pattern: &[u8]) {
        if !self.available || pattern.is_empty() {
            return;
        }

        if pattern.len() > 255 {
            // An offset can't be represented in a u8; give up entirely
            // rather than silently truncate (would risk a false negative).
            self.available = false;
            return;
        }

        let mut rarest = (pattern[0], freq::rank(pattern[0]));
        let mut found_existing = None;

        for (i, &b) in pattern.iter().enumerate() {
            let off = i as u8;
            if off > self.offsets[b as usize] {
                self.offsets[b as usize] = off;
            }

            if found_existing.is_none() && self.bytes.contains(&b) {
                found_existing = Some(b);
            }

            let rank = freq::rank(b);
            if rank < rarest.1 {
                rarest = (b, rank);
            }
        }

        let chosen = found_existing.unwrap_or(rarest.0);
        if !self.bytes.contains(&chosen) {
            self.bytes.push(chosen);
        }
    }

    fn eligible(&self) -> bool {
        self.available && !self.bytes.is_empty() && self.bytes.len() <= 3
    }

    fn rank_sum(&self) -> u32 {
        self.bytes.iter().map(|&b| freq::rank(b) as u32).sum()
    }
}

/// Builds the best available [`Prefilter`] by feeding it every pattern that
/// will go into the automaton, then calling [`PrefilterBuilder::build`].
#[derive(Debug, Default)]
pub struct PrefilterBuilder {
    start: StartByteBuilder,
    rare: RareByteBuilder,
}

impl PrefilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: &[u8]) {
        self.start.add(pattern);
        self.rare.add(pattern);
    }

    /// Select a prefilter (spec.md §4.2's selection rule), or `None` if
    /// neither the start-byte nor rare-byte set qualifies.
    pub fn build(&self) -> Option<Prefilter> {
        let start_ok = self.start.eligible();
        let rare_ok = self.rare.eligible();

        match (start_ok, rare_ok) {
            (true, true) => {
                if self.start.bytes.len() < self.rare.bytes.len() {
                    Some(Prefilter::StartByte(self.start.bytes.clone()))
                } else if self.start.rank_sum() <= self.rare.rank_sum() + 50 {
                    Some(Prefilter::StartByte(self.start.bytes.clone()))
                } else {
                    Some(Prefilter::RareByte {
                        bytes: self.rare.bytes.clone(),
                        offsets: self.rare.offsets,
                    })
                }
            }
            (true, false) => Some(Prefilter::StartByte(self.start.bytes.clone())),
            (false, true) => Some(Prefilter::RareByte {
                bytes: self.rare.bytes.clone(),
                offsets: self.rare.offsets,
            }),
            (false, false) => None,
        }
    }
}

/// Per-scan mutable state tracking whether the prefilter is still paying for
/// itself (spec.md §4.2's "effectiveness throttle").
#[derive(Debug)]
pub struct EffectivenessState {
    max_pattern_length: usize,
    skip_count: u32,
    bytes_skipped: u64,
    last_scan_position: usize,
    inert: bool,
}

impl EffectivenessState {
    pub fn new(max_pattern_length: usize) -> Self {
        EffectivenessState {
            max_pattern_length: max_pattern_length.max(1),
            skip_count: 0,
            bytes_skipped: 0,
            last_scan_position: 0,
            inert: false,
        }
    }

    /// Whether the prefilter should still be consulted at position `at`.
    pub fn is_effective(&self, at: usize) -> bool {
        if self.inert || at < self.last_scan_position {
            return false;
        }

        if self.skip_count < EFFECTIVENESS_FLOOR {
            return true;
        }

        let avg = self.bytes_skipped as f64 / self.skip_count as f64;
        avg > 2.0 * self.max_pattern_length as f64
    }

    /// Record a skip from `from` to `to` and re-evaluate inertness once
    /// enough samples have accumulated. Returns `true` the first time this
    /// call causes the prefilter to go inert for the rest of the scan.
    pub fn record_skip(&mut self, from: usize, to: usize) -> bool {
        let skipped = to.saturating_sub(from) as u64;
        self.skip_count += 1;
        self.bytes_skipped += skipped;
        self.last_scan_position = to;

        if !self.inert && self.skip_count >= EFFECTIVENESS_FLOOR {
            let avg = self.bytes_skipped as f64 / self.skip_count as f64;
            if avg <= 2.0 * self.max_pattern_length as f64 {
                self.inert = true;
                return true;
            }
        }

        false
    }

    pub fn skip_count(&self) -> u32 {
        self.skip_count
    }

    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped
    }
}
