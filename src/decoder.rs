//! Pull-based, resumable decoder: turns an `eazy`-encoded byte stream back
//! into the original bytes.
//!
//! Mirrors `lz4_flex`'s `frame::FrameDecoder<R>` shape — a generic reader
//! wrapped by a small state machine — but the state machine itself follows
//! `nikandfor/eazy`'s Go `Decoder`: a record is parsed into a pending
//! `Literal`/`Copy` span, which is then drained into the caller's buffer
//! across as many `read` calls as it takes.

use std::io::{self, Read};

use crate::error::{Error, Result};
use crate::wire;
use crate::window::Window;

/// What the decoder is in the middle of producing. `Idle` means the next
/// byte available is a fresh tag byte.
#[derive(Debug, Clone, Copy)]
enum State {
    Idle,
    Literal(u64),
    /// Absolute window position to read from next, and bytes remaining.
    Copy(u64, u64),
}

/// A resumable decoder over a [`Read`] byte source.
///
/// `read` can be called with buffers of any size, including ones too small
/// to hold a whole record; state survives across calls. Once `read` returns
/// `Err(_)`, the same error is returned by every subsequent call (sticky),
/// matching spec §7 — construct a new `Decoder` (or call [`Decoder::reset`])
/// to recover.
#[derive(Debug)]
pub struct Decoder<R> {
    r: R,
    window: Option<Window>,
    state: State,
    buf: Vec<u8>,
    /// Index of the first unconsumed byte in `buf`.
    start: usize,
    /// Index one past the last valid byte in `buf`.
    end: usize,
    err: Option<Error>,
}

/// Initial capacity for the decoder's internal input buffer; doubled as
/// needed to satisfy a single record's encoded length.
const INITIAL_BUF_SIZE: usize = 4096;

impl<R: Read> Decoder<R> {
    pub fn new(r: R) -> Self {
        Decoder {
            r,
            window: None,
            state: State::Idle,
            buf: Vec::new(),
            start: 0,
            end: 0,
            err: None,
        }
    }

    /// Rebinds the decoder to a new source, discarding all buffered input,
    /// pending state, and the window — equivalent to building a fresh
    /// `Decoder`, but reusing the input buffer's allocation.
    pub fn reset(&mut self, r: R) {
        self.r = r;
        self.window = None;
        self.state = State::Idle;
        self.start = 0;
        self.end = 0;
        self.err = None;
    }

    pub fn get_ref(&self) -> &R {
        &self.r
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.r
    }

    pub fn into_inner(self) -> R {
        self.r
    }

    /// Fills `buf` with decoded bytes, returning how many were written.
    ///
    /// Like [`Read::read`], a short (including zero-length) result on an
    /// `Ok` does not by itself mean the stream ended — only an `Err`
    /// (`Error::Eof` at a clean record boundary, `Error::UnexpectedEof`
    /// mid-record) is a terminal signal. Bytes already produced before an
    /// error is discovered are returned as `Ok` first; the error surfaces on
    /// the following call.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(e) = &self.err {
            return Err(e.clone());
        }

        let mut written = 0;
        while written < buf.len() {
            match self.state {
                State::Idle => {
                    if let Err(e) = self.parse_record_head() {
                        return self.fail(e, written);
                    }
                }
                State::Literal(remaining) => {
                    if remaining == 0 {
                        self.state = State::Idle;
                        continue;
                    }
                    let want = ((buf.len() - written) as u64).min(remaining) as usize;
                    if !self.more(want) {
                        let e = self.err.clone().expect("more() sets err on failure");
                        return self.fail(e, written);
                    }
                    let window = match self.window.as_mut() {
                        Some(w) => w,
                        None => return self.fail(Error::UnexpectedEof, written),
                    };
                    let src = &self.buf[self.start..self.start + want];
                    buf[written..written + want].copy_from_slice(src);
                    window.write(src);
                    self.start += want;
                    written += want;
                    self.state = State::Literal(remaining - want as u64);
                }
                State::Copy(src, remaining) => {
                    if remaining == 0 {
                        self.state = State::Idle;
                        continue;
                    }
                    let want = ((buf.len() - written) as u64).min(remaining) as usize;
                    let window = match self.window.as_mut() {
                        Some(w) => w,
                        None => return self.fail(Error::UnexpectedEof, written),
                    };
                    let mut produced = Vec::with_capacity(want);
                    window.copy_from_window(src, want, &mut produced);
                    buf[written..written + want].copy_from_slice(&produced);
                    written += want;
                    self.state = State::Copy(src + want as u64, remaining - want as u64);
                }
            }
        }
        Ok(written)
    }

    /// Reads decoded output into a fresh `Vec`, treating a clean `Eof` as
    /// success. Convenience wrapper over repeated [`Decoder::read`] calls.
    ///
    /// `read` only ever returns `Ok(0)` for a zero-length caller buffer, so
    /// with our fixed-size `chunk` the loop always makes progress or hits an
    /// `Err`.
    pub fn decode_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match self.read(&mut chunk) {
                Ok(n) => out.extend_from_slice(&chunk[..n]),
                Err(Error::Eof) => return Ok(out),
                Err(e) => return Err(e),
            }
        }
    }

    fn fail(&mut self, e: Error, written: usize) -> Result<usize> {
        self.err = Some(e.clone());
        if written > 0 {
            Ok(written)
        } else {
            Err(e)
        }
    }

    /// Parses one tag/meta byte and whatever follows it, leaving `self.state`
    /// set to `Literal`/`Copy` (or still `Idle`, for a meta record that
    /// carries no payload bytes for the caller).
    fn parse_record_head(&mut self) -> Result<()> {
        if !self.more(1) {
            return Err(self.err.clone().expect("more() sets err on failure"));
        }
        let tag = self.buf[self.start];
        self.start += 1;

        let major = tag & wire::TAG_MASK;
        let low7 = tag & wire::TAG_LEN_MASK;

        if major == wire::TAG_LITERAL && low7 == 0 {
            return self.parse_meta();
        }

        let extra = wire::len_extra_bytes(low7).ok_or(Error::ImpossibleTag(tag))?;
        if extra > 0 && !self.more(extra) {
            return Err(self.err.clone().expect("more() sets err on failure"));
        }
        let len = wire::decode_len(low7, &self.buf[self.start..self.start + extra]);
        self.start += extra;

        if major == wire::TAG_COPY {
            if !self.more(1) {
                return Err(self.err.clone().expect("more() sets err on failure"));
            }
            let first = self.buf[self.start];
            self.start += 1;
            let oextra = wire::off_extra_bytes(first);
            if oextra > 0 && !self.more(oextra) {
                return Err(self.err.clone().expect("more() sets err on failure"));
            }
            let off = wire::decode_off(first, &self.buf[self.start..self.start + oextra]);
            self.start += oextra;

            let pos = match &self.window {
                Some(w) => w.pos(),
                None => return Err(Error::UnexpectedEof),
            };
            let src = pos.saturating_sub(off).saturating_sub(len);
            self.state = State::Copy(src, len);
        } else {
            self.state = State::Literal(len);
        }
        Ok(())
    }

    fn parse_meta(&mut self) -> Result<()> {
        if !self.more(1) {
            return Err(self.err.clone().expect("more() sets err on failure"));
        }
        let meta_byte = self.buf[self.start];
        self.start += 1;
        let (meta_tag, _size) = wire::split_meta_byte(meta_byte);

        match meta_tag {
            wire::META_MAGIC => {
                if !self.more(wire::MAGIC_BYTES.len()) {
                    return Err(self.err.clone().expect("more() sets err on failure"));
                }
                // The version/content of the magic string is not validated
                // (spec §9 "Unspecified behaviour"); only its length matters.
                self.start += wire::MAGIC_BYTES.len();
                Ok(())
            }
            wire::META_RESET => {
                if !self.more(1) {
                    return Err(self.err.clone().expect("more() sets err on failure"));
                }
                let first = self.buf[self.start];
                self.start += 1;
                let oextra = wire::off_extra_bytes(first);
                if oextra > 0 && !self.more(oextra) {
                    return Err(self.err.clone().expect("more() sets err on failure"));
                }
                let bs_log = wire::decode_off(first, &self.buf[self.start..self.start + oextra]);
                self.start += oextra;

                let size = 1usize
                    .checked_shl(bs_log as u32)
                    .ok_or(Error::ImpossibleTag(meta_byte))?;
                match &mut self.window {
                    Some(w) => w.reset(size),
                    None => self.window = Some(Window::new(size)),
                }
                Ok(())
            }
            // Reported as the full meta byte, not just the top-5-bit tag:
            // spec's worked example for an unknown-meta stream names the
            // raw byte (0xFF) as the error payload.
            _ => Err(Error::UnsupportedMeta(meta_byte)),
        }
    }

    /// Ensures at least `need` unconsumed bytes are buffered, pulling more
    /// from the reader (growing the buffer geometrically) as necessary.
    /// Returns `false` and sets `self.err` if the source is exhausted or
    /// fails before `need` bytes are available.
    fn more(&mut self, need: usize) -> bool {
        if self.err.is_some() {
            return false;
        }
        if self.start + need <= self.end {
            return true;
        }

        self.buf.copy_within(self.start..self.end, 0);
        self.end -= self.start;
        self.start = 0;

        if self.buf.is_empty() {
            self.buf.resize(INITIAL_BUF_SIZE.max(need), 0);
        }
        while self.end + need > self.buf.len() {
            let grow = self.buf.len().max(need);
            self.buf.resize(self.buf.len() + grow, 0);
        }

        let mut io_failure = None;
        while self.start + need > self.end {
            match self.r.read(&mut self.buf[self.end..]) {
                Ok(0) => break,
                Ok(n) => self.end += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    io_failure = Some(e);
                    break;
                }
            }
        }

        if self.start + need <= self.end {
            return true;
        }

        self.err = Some(match io_failure {
            Some(e) => Error::from(e),
            None if self.start == self.end => Error::Eof,
            None => Error::UnexpectedEof,
        });
        false
    }
}

/// Decodes a complete, self-contained `eazy` stream held entirely in
/// memory. A thin wrapper over `Decoder::new(input).decode_all()`, mirroring
/// `lz4_flex::frame::decompress`.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    Decoder::new(input).decode_all()
}
