//! Zone-file parser: master-file text (RFC 1035 §5) to wire-format records.
//!
//! [`Parser`] drives the `zf-scan` tokenizer through the control grammar —
//! `$ORIGIN`, `$TTL`, `$INCLUDE`, blank-owner continuation, class and TTL in
//! either order — and encodes each record's RDATA into wire format with
//! per-type field encoders. Records are handed to a [`Sink`] one at a time;
//! the buffers behind a [`Record`] are only valid for the duration of the
//! call.
//!
//! ```no_run
//! use std::ops::ControlFlow;
//! use zf_zone::{Options, Parser, Record};
//!
//! let mut parser = Parser::new(Options::default()).unwrap();
//! let mut count = 0u64;
//! parser
//!     .parse_str(
//!         "<input>",
//!         "example.com. 300 IN A 192.0.2.1\n",
//!         &mut |_record: &Record<'_>| {
//!             count += 1;
//!             ControlFlow::<()>::Continue(())
//!         },
//!     )
//!     .unwrap();
//! ```

mod error;
mod mnemonic;
mod name;
mod options;
mod parser;
mod rdata;
mod record;
mod types;

pub use error::{ErrorKind, ParseError};
pub use mnemonic::class_code;
pub use options::Options;
pub use parser::Parser;
pub use record::{Record, Sink, MAX_RDATA};
