//! Push-based encoder: scans input against a circular window via a
//! single-slot hash table and emits tagged literal/copy records to a sink.
//!
//! The match-search loop below is a direct, line-for-line translation of
//! `nikandfor/eazy`'s Go `Writer.Write` (see `original_source/encoder.go`):
//! position bookkeeping is kept in `i64` throughout, matching Go's signed
//! `int`, because the backward-extension step can transiently compute a
//! negative absolute position (when a candidate's recorded position is 0)
//! that is only ever used masked — two's-complement bit patterns make
//! `(negative as u64) & mask` agree with Go's `negative_int & mask` exactly.

use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::hashtable::{self, HashTable};
use crate::window::Window;
use crate::wire;

/// Floor enforced by [`Encoder::new`], matching the teacher-shaped
/// `NewWriter` constructor in the original.
const MIN_WINDOW_SIZE: usize = 1024;
/// Floor enforced by [`Encoder::with_hash_table_size`], the lower-level
/// constructor used by tests that probe small windows (spec §9).
const MIN_TEST_WINDOW_SIZE: usize = 32;
/// Ceiling used by the `compress` convenience function when picking a
/// window size from input length alone.
const MAX_AUTO_WINDOW_SIZE: usize = 1 << 20;

/// Matches exist only with a run of at least this many bytes; anything
/// shorter is cheaper to leave as literal bytes (spec §4.3).
const MIN_MATCH_LEN: i64 = 5;

/// A streaming encoder over a byte sink `W`.
///
/// Call [`Write::write`]/[`Write::write_all`] (from `std::io::Write`, which
/// this type implements) repeatedly with input chunks; each call emits zero
/// or more complete tagged records to the sink in a single underlying
/// write. Call [`Encoder::finish`] to recover the sink once done.
#[derive(Debug)]
pub struct Encoder<W> {
    sink: W,
    append_magic: bool,
    window: Window,
    ht: HashTable,
    /// Scratch output buffer, rebuilt from scratch on every `write` call and
    /// flushed to the sink in one shot (spec §4.3 "a record never straddles
    /// calls").
    out: Vec<u8>,
}

impl<W: Write> Encoder<W> {
    /// Constructs an encoder with `window_size` bytes of history and a
    /// hash table sized `window_size / 64` (spec §6 defaults).
    ///
    /// # Panics
    /// Panics if `window_size` is not a power of two, or is smaller than
    /// 1 KiB.
    pub fn new(sink: W, window_size: usize) -> Self {
        assert!(
            window_size.is_power_of_two() && window_size >= MIN_WINDOW_SIZE,
            "window size must be a power of two and at least 1KiB"
        );
        Self::with_hash_table_size(sink, window_size, hashtable::default_size(window_size))
    }

    /// Lower-level constructor taking an explicit hash table size and
    /// accepting window sizes down to 32 bytes, for tests exercising the
    /// aliasing-shrink paths at small scale (spec §9 recommends windows in
    /// `{32, 64, 128}`).
    ///
    /// # Panics
    /// Panics if either size is not a power of two, if `window_size < 32`,
    /// or if `hash_table_size < 4`.
    pub fn with_hash_table_size(sink: W, window_size: usize, hash_table_size: usize) -> Self {
        assert!(
            window_size.is_power_of_two() && window_size >= MIN_TEST_WINDOW_SIZE,
            "window size must be a power of two and at least 32 bytes"
        );
        Encoder {
            sink,
            append_magic: true,
            window: Window::new(window_size),
            ht: HashTable::new(hash_table_size),
            out: Vec::new(),
        }
    }

    /// Sets whether the stream header includes the optional magic record
    /// (default `true`). Takes effect on the next header emission, i.e. the
    /// next `write` after construction or `reset`.
    pub fn set_append_magic(&mut self, append_magic: bool) {
        self.append_magic = append_magic;
    }

    /// Reinitialises the window and hash table, keeping the same sink. The
    /// next `write` re-emits the stream header, producing output
    /// independent of anything written before the reset.
    pub fn reset(&mut self) {
        let size = self.window.size();
        self.window.reset(size);
        self.ht.clear();
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Flushes the sink and returns it.
    pub fn finish(mut self) -> Result<W> {
        io::Write::flush(&mut self.sink)?;
        Ok(self.sink)
    }

    /// Runs the match-search algorithm over `p`, appending every emitted
    /// record to `self.out`, then writes `self.out` to the sink in one
    /// call. On a short write or I/O error the encoder resets itself so the
    /// next call starts a fresh, self-contained stream (spec §4.3, §7).
    fn encode_chunk(&mut self, p: &[u8]) -> Result<()> {
        self.out.clear();

        if self.window.pos() == 0 {
            if self.append_magic {
                wire::append_meta_magic(&mut self.out);
            }
            let bs_log = self.window.size().trailing_zeros() as u8;
            wire::append_meta_reset(&mut self.out, bs_log);
        }

        let start = self.window.pos() as i64;
        let p_len = p.len() as i64;
        let mut done: i64 = 0;
        let mut i: i64 = 0;

        while i + 4 < p_len {
            let word = hashtable::read_word(p, i as usize);
            let cand = self.ht.get(word);
            self.ht.put(word, (start + i) as u32);

            let committed = start + done;
            let off = committed - cand as i64;
            if off <= (i - done) + 4 || off >= self.window.size() as i64 {
                i += 1;
                continue;
            }

            // Extend backward from the match trigger point, bounded by the
            // pending literal's start (`done`).
            let mut ist = i - 1;
            let mut st = cand as i64 - 1;
            while ist >= done && p[ist as usize] == self.window_byte(st) {
                ist -= 1;
                st -= 1;
            }
            ist += 1;
            st += 1;

            // Extend forward from the trigger point.
            let mut iend = i;
            let mut end = cand as i64;
            while iend < p_len && p[iend as usize] == self.window_byte(end) {
                iend += 1;
                end += 1;
            }

            if end - st <= 4 {
                i += 1;
                continue;
            }

            let off_at_i = start + i - cand as i64;
            let lit = ist - done;
            let cst = st + off_at_i;
            let cend_initial = end + off_at_i;

            // Shrink 1: copy source and destination overlap across a full
            // window length in the circular buffer.
            let overflow = cend_initial - self.window.size() as i64 - st;
            if overflow > 0 {
                end -= overflow;
                iend -= overflow;
            }

            // Shrink 2: copy destination would overlap the pending literal
            // region. Deliberately compares against the *un-shrunk* `cst`
            // computed above, matching the original's variable reuse.
            let overlap = end - cst + lit;
            if overlap > 0 {
                end -= overlap;
                iend -= overlap;
            }

            if end - st <= MIN_MATCH_LEN - 1 {
                i += 1;
                continue;
            }

            let cend = end + off_at_i;

            let mask = self.window.mask() as i64;
            if !(st & mask >= cend & mask || cst & mask >= end & mask) {
                return Err(Error::InternalAliasingFailure);
            }

            if done < ist {
                self.emit_literal(p, done as usize, ist as usize);
                self.window.write(&p[done as usize..ist as usize]);
            }
            self.emit_copy(st, end);
            self.window.write(&p[ist as usize..iend as usize]);

            if (i as usize) + 5 <= p.len() {
                let next_word = hashtable::read_word(p, i as usize + 1);
                self.ht.put(next_word, (start + i + 1) as u32);
            }

            i = iend;
            done = iend;
        }

        if done < p_len {
            self.emit_literal(p, done as usize, p.len());
            self.window.write(&p[done as usize..]);
        }

        match self.sink.write(&self.out) {
            Ok(n) if n == self.out.len() => Ok(()),
            Ok(_) => {
                self.reset();
                Err(Error::SinkFailure(io::Error::from(
                    io::ErrorKind::WriteZero,
                )))
            }
            Err(e) => {
                self.reset();
                Err(Error::SinkFailure(e))
            }
        }
    }

    #[inline]
    fn window_byte(&self, abs: i64) -> u8 {
        self.window.byte_at(abs as u64)
    }

    fn emit_literal(&mut self, p: &[u8], st: usize, end: usize) {
        wire::append_tag(&mut self.out, wire::TAG_LITERAL, (end - st) as u64);
        self.out.extend_from_slice(&p[st..end]);
    }

    /// Appends a copy tag for the range `[st, end)` (absolute window
    /// positions); the back-distance is computed from the window's current
    /// position, i.e. *before* this copy's own bytes are written — matching
    /// what the decoder will have synchronised to at parse time.
    fn emit_copy(&mut self, st: i64, end: i64) {
        wire::append_tag(&mut self.out, wire::TAG_COPY, (end - st) as u64);
        let back_distance = self.window.pos() as i64 - end;
        wire::append_off(&mut self.out, back_distance as u64);
    }
}

impl<W: Write> io::Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.encode_chunk(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

/// Picks a window size from an input length alone: the next power of two
/// at least as large as the input, clamped to `[1024, 1 << 20]`. Used by the
/// [`compress`] convenience function, which has no caller-supplied size to
/// work with.
fn auto_window_size(input_len: usize) -> usize {
    input_len
        .max(1)
        .next_power_of_two()
        .clamp(MIN_WINDOW_SIZE, MAX_AUTO_WINDOW_SIZE)
}

/// Compresses `input` into a self-contained, in-memory `eazy` stream,
/// picking a window size automatically. Mirrors `lz4_flex::compress`.
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new(), auto_window_size(input.len()));
    enc.write_all(input)
        .expect("writing to an in-memory Vec<u8> sink cannot fail");
    enc.finish()
        .expect("flushing an in-memory Vec<u8> sink cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decompress;

    fn encode_with(window_size: usize, input: &[u8]) -> Vec<u8> {
        let mut enc = Encoder::new(Vec::new(), window_size);
        enc.write_all(input).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn e1_empty_input_is_header_only() {
        let out = encode_with(1024, b"");
        assert_eq!(out, b"\x00\x02eazy\x00\x09\x0a");
        assert_eq!(decompress(&out).unwrap(), b"");
    }

    #[test]
    fn e2_all_literal_roundtrips() {
        let input: Vec<u8> = (0..16).collect();
        let out = encode_with(1024, &input);
        let header_len = b"\x00\x02eazy\x00\x09\x0a".len();
        assert_eq!(out[header_len], 16); // bare literal tag, length 16 direct
        assert_eq!(&out[header_len + 1..], &input[..]);
        assert_eq!(decompress(&out).unwrap(), input);
    }

    #[test]
    fn e3_single_repeat_roundtrips() {
        // A single-write, first-ever match candidate here is rejected by the
        // `off <= i-done+4` filter (step 2), same as the Go original: the
        // whole 16 bytes come out as one literal. The cross-`write` case
        // below is what actually exercises a Copy record.
        let input = b"abcdefghabcdefgh";
        let out = encode_with(1024, input);
        assert_eq!(decompress(&out).unwrap(), input);
    }

    #[test]
    fn e3_repeat_across_writes_emits_a_copy() {
        let mut enc = Encoder::new(Vec::new(), 1024);
        enc.write_all(b"abcdefgh").unwrap();
        enc.write_all(b"abcdefgh").unwrap();
        let out = enc.finish().unwrap();
        assert_eq!(decompress(&out).unwrap(), b"abcdefghabcdefgh");
        // A Copy tag byte has its high bit set.
        assert!(out.iter().any(|&b| b & wire::TAG_MASK == wire::TAG_COPY));
    }

    #[test]
    fn e4_long_run_self_references() {
        let input = vec![b'A'; 100];
        let out = encode_with(1024, &input);
        assert_eq!(decompress(&out).unwrap(), input);
    }

    #[test]
    fn e5_cross_boundary_match_spans_writes() {
        let pattern: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
        let mut enc = Encoder::new(Vec::new(), 4096);
        enc.write_all(&pattern).unwrap();
        enc.write_all(&pattern).unwrap();
        let out = enc.finish().unwrap();
        let mut expected = pattern.clone();
        expected.extend_from_slice(&pattern);
        assert_eq!(decompress(&out).unwrap(), expected);
    }

    #[test]
    fn header_matches_spec_worked_example() {
        let out = encode_with(1024, b"");
        // Literal|Meta, MetaMagic|2, "eazy", Literal|Meta, MetaReset|1, bs_log
        assert_eq!(&out[..8], b"\x00\x02eazy\x00\x09");
        assert_eq!(out[8], 10); // log2(1024) == 10
    }

    #[test]
    fn append_magic_false_omits_magic_record() {
        let mut enc = Encoder::new(Vec::new(), 1024);
        enc.set_append_magic(false);
        enc.write_all(b"").unwrap();
        let out = enc.finish().unwrap();
        assert_eq!(out, vec![0x00, 0x09, 10]);
    }

    #[test]
    fn reset_reproduces_fresh_instance_output() {
        let mut enc = Encoder::new(Vec::new(), 1024);
        enc.write_all(b"hello world, hello world").unwrap();
        enc.reset();
        enc.write_all(b"second stream").unwrap();
        let after_reset = enc.finish().unwrap();

        let fresh = encode_with(1024, b"second stream");
        assert_eq!(after_reset, fresh);
    }

    #[test]
    fn small_windows_do_not_trip_the_aliasing_assertion() {
        for window_size in [32usize, 64, 128] {
            for input in [
                &b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"[..],
                b"abababababababababababababababababababab",
                b"the quick brown fox jumps over the lazy dog, again and again",
            ] {
                let mut enc = Encoder::with_hash_table_size(Vec::new(), window_size, 4);
                enc.write_all(input).unwrap();
                let out = enc.finish().unwrap();
                assert_eq!(decompress(&out).unwrap(), input);
            }
        }
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two_window() {
        let _ = Encoder::new(Vec::new(), 1000);
    }

    #[test]
    #[should_panic(expected = "1KiB")]
    fn rejects_window_below_floor() {
        let _ = Encoder::new(Vec::new(), 512);
    }
}
