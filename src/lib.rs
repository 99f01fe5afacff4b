/*! A streaming, LZ77-family byte-level compression codec for log and
telemetry-style workloads, where data is produced incrementally and must be
written through a sink without buffering the whole input.

`eazy` compresses an arbitrary input byte stream into a self-delimiting
tagged sequence (tag bytes, variable-length lengths/offsets, and meta
records — see the `wire` module internals) that a [`Decoder`] on the other
end turns back into the exact original bytes. There is no entropy coding
stage, no random access, and no integrity checking; see the module docs on
[`Encoder`] and [`Decoder`] for the matching algorithm and wire format.

# Examples
```
use eazy::{Encoder, Decoder};
use std::io::Write;

let mut enc = Encoder::new(Vec::new(), 1024);
enc.write_all(b"hello world, hello world").unwrap();
let compressed = enc.finish().unwrap();

let decompressed = Decoder::new(compressed.as_slice()).decode_all().unwrap();
assert_eq!(decompressed, b"hello world, hello world");
```

Or, for a one-shot in-memory buffer, the [`compress`]/[`decompress`]
convenience functions:
```
use eazy::{compress, decompress};
let input: &[u8] = b"Hello people, what's up?";
let compressed = compress(input);
let decompressed = decompress(&compressed).unwrap();
assert_eq!(input, decompressed);
```

# Feature flags
`std` (default, and currently mandatory): the encoder and decoder are built
on [`std::io::Write`]/[`std::io::Read`]; there is no alternative transport.
*/

mod error;
mod hashtable;
mod wire;
mod window;

pub mod decoder;
pub mod encoder;

pub use decoder::{decompress, Decoder};
pub use encoder::{compress, Encoder};
pub use error::{Error, Result};
