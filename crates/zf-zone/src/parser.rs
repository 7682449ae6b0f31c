//! The control parser: directives, owner handling, type dispatch, and the
//! field-descriptor walk that drives the RDATA encoders.

use std::io::BufReader;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use tracing::{debug, warn};
use zf_scan::{Input, LexError, Lexer, Token, TokenKind};

use crate::error::{ErrorKind, ParseError};
use crate::mnemonic;
use crate::name::{self, NameError, WireName};
use crate::options::Options;
use crate::rdata::{self, EncodeError, Rdata};
use crate::record::{Record, Sink};
use crate::types::{self, FieldInfo, FieldKind, TypeInfo};

/// One input source: the top-level file or an `$INCLUDE`. Origin and
/// previous owner are per file and revert when an include pops.
struct File {
    path: String,
    dir: PathBuf,
    canonical: Option<PathBuf>,
    lexer: Lexer<'static>,
    origin: Option<WireName>,
    owner: Option<WireName>,
    last_offset: usize,
}

impl File {
    fn lex(&mut self) -> Result<Token, ParseError> {
        match self.lexer.lex() {
            Ok(token) => {
                self.last_offset = token.start;
                Ok(token)
            }
            Err(e) => {
                let kind = match e {
                    LexError::Read(e) => ErrorKind::Read(e),
                    LexError::NestedGroup => ErrorKind::NestedOpenBrace,
                    LexError::UnmatchedGroup => ErrorKind::UnmatchedCloseBrace,
                    LexError::OpenGroupAtEof => {
                        ErrorKind::Syntax("missing closing brace at end of input".into())
                    }
                    LexError::UnterminatedString => {
                        ErrorKind::Syntax("unterminated quoted string".into())
                    }
                    LexError::StrayNul => ErrorKind::Syntax("stray NUL byte in input".into()),
                };
                Err(self.error(kind))
            }
        }
    }

    fn error(&self, kind: ErrorKind) -> ParseError {
        ParseError {
            kind,
            file: self.path.clone(),
            line: self.lexer.line(),
            column: self.lexer.column_of(self.last_offset),
        }
    }

    /// Field-level failure dressed with the field and type names.
    fn invalid(&self, ty: &TypeInfo, field: &FieldInfo, e: EncodeError) -> ParseError {
        let kind = match e {
            EncodeError::Syntax => {
                ErrorKind::Syntax(format!("invalid {} in {} record", field.name, ty.name))
            }
            EncodeError::Semantic => {
                ErrorKind::Semantic(format!("invalid {} in {} record", field.name, ty.name))
            }
            EncodeError::OutOfMemory => ErrorKind::OutOfMemory,
        };
        self.error(kind)
    }

    fn missing(&self, ty: &TypeInfo, field: &FieldInfo) -> ParseError {
        self.error(ErrorKind::Syntax(format!(
            "missing {} in {} record",
            field.name, ty.name
        )))
    }

    fn bytes(&self, token: &Token) -> &[u8] {
        self.lexer.token_bytes(token)
    }
}

enum Flow {
    Continue,
    Push(File),
    Cancel,
}

/// The zone parser. One instance drives one input at a time; the scratch
/// buffers (RDATA, bitmaps, parameter sets) are reused across records.
pub struct Parser {
    options: Options,
    base_origin: Option<WireName>,
    default_ttl: Option<u32>,
    rdata: Rdata,
    nsec: rdata::nsec::NsecBitmap,
    nxt: rdata::nsec::NxtBitmap,
    wks: rdata::wks::PortBitmap,
    svcb: rdata::svcb::ParamSet,
    loc_tokens: Vec<Vec<u8>>,
}

impl Parser {
    pub fn new(options: Options) -> Result<Self, ParseError> {
        let base_origin = match &options.origin {
            Some(text) => Some(name::encode(text.as_bytes(), None).map_err(|e| ParseError {
                kind: match e {
                    NameError::RelativeWithoutOrigin => {
                        ErrorKind::Semantic("configured origin must be absolute".into())
                    }
                    other => ErrorKind::Syntax(format!(
                        "invalid configured origin: {}",
                        other.describe()
                    )),
                },
                file: "<options>".into(),
                line: 0,
                column: 0,
            })?),
            None => None,
        };
        Ok(Parser {
            options,
            base_origin,
            default_ttl: None,
            rdata: Rdata::new(),
            nsec: rdata::nsec::NsecBitmap::new(),
            nxt: rdata::nsec::NxtBitmap::default(),
            wks: rdata::wks::PortBitmap::new(),
            svcb: rdata::svcb::ParamSet::default(),
            loc_tokens: Vec::new(),
        })
    }

    /// Parse a zone file from disk. Returns the number of records emitted.
    pub fn parse_file(
        &mut self,
        path: impl AsRef<Path>,
        sink: &mut dyn Sink,
    ) -> Result<u64, ParseError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let file = self
            .open(path, self.base_origin)
            .map_err(|kind| ParseError { kind, file: display, line: 0, column: 0 })?;
        self.run(file, sink)
    }

    /// Parse in-memory text; `name` only labels error locations.
    pub fn parse_str(
        &mut self,
        name: &str,
        text: &str,
        sink: &mut dyn Sink,
    ) -> Result<u64, ParseError> {
        self.parse_bytes(name, text.as_bytes(), sink)
    }

    pub fn parse_bytes(
        &mut self,
        name: &str,
        bytes: &[u8],
        sink: &mut dyn Sink,
    ) -> Result<u64, ParseError> {
        let reader = std::io::Cursor::new(bytes.to_vec());
        let lexer = Lexer::new(Input::Reader(Box::new(reader)), self.options.window_size)
            .map_err(|e| ParseError {
                kind: match e {
                    LexError::Read(e) => ErrorKind::Read(e),
                    _ => ErrorKind::Syntax("malformed input".into()),
                },
                file: name.to_string(),
                line: 0,
                column: 0,
            })?;
        let file = File {
            path: name.to_string(),
            dir: PathBuf::from("."),
            canonical: None,
            lexer,
            origin: self.base_origin,
            owner: None,
            last_offset: 0,
        };
        self.run(file, sink)
    }

    fn open(&self, path: &Path, origin: Option<WireName>) -> Result<File, ErrorKind> {
        let display = path.display().to_string();
        let metadata =
            std::fs::metadata(path).map_err(|_| ErrorKind::NotAFile(display.clone()))?;
        if !metadata.is_file() {
            return Err(ErrorKind::NotAFile(display));
        }
        let handle = std::fs::File::open(path).map_err(ErrorKind::Read)?;
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let lexer = Lexer::new(
            Input::Reader(Box::new(BufReader::new(handle))),
            self.options.window_size,
        )
        .map_err(|e| match e {
            LexError::Read(e) => ErrorKind::Read(e),
            _ => ErrorKind::Syntax("malformed input".into()),
        })?;
        Ok(File {
            path: display,
            dir: path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")),
            canonical: Some(canonical),
            lexer,
            origin,
            owner: None,
            last_offset: 0,
        })
    }

    fn run(&mut self, file: File, sink: &mut dyn Sink) -> Result<u64, ParseError> {
        self.default_ttl = self.options.default_ttl;
        let mut current = file;
        let mut stack: Vec<File> = Vec::new();
        let mut visited: FxHashSet<PathBuf> = FxHashSet::default();
        if let Some(canonical) = &current.canonical {
            visited.insert(canonical.clone());
        }
        let mut count = 0u64;

        loop {
            let token = current.lex()?;
            match token.kind {
                TokenKind::Delimiter => continue,
                TokenKind::Eof => match stack.pop() {
                    Some(parent) => {
                        debug!(path = %current.path, "leaving $INCLUDE");
                        if let Some(canonical) = &current.canonical {
                            visited.remove(canonical);
                        }
                        current = parent;
                    }
                    None => break,
                },
                _ => match self.record(&mut current, token, sink, &mut count)? {
                    Flow::Continue => {}
                    Flow::Cancel => break,
                    Flow::Push(child) => {
                        if stack.len() as u32 + 1 > self.options.include_depth {
                            return Err(current
                                .error(ErrorKind::Syntax("$INCLUDE nested too deeply".into())));
                        }
                        if let Some(canonical) = &child.canonical {
                            if !visited.insert(canonical.clone()) {
                                return Err(current
                                    .error(ErrorKind::Syntax("recursive $INCLUDE".into())));
                            }
                        }
                        debug!(path = %child.path, "entering $INCLUDE");
                        stack.push(current);
                        current = child;
                    }
                },
            }
        }
        Ok(count)
    }

    fn record(
        &mut self,
        file: &mut File,
        first: Token,
        sink: &mut dyn Sink,
        count: &mut u64,
    ) -> Result<Flow, ParseError> {
        let start_of_line = file.lexer.start_of_line();

        if start_of_line
            && first.kind == TokenKind::Contiguous
            && file.bytes(&first).first() == Some(&b'$')
        {
            return self.directive(file, &first);
        }

        let mut token = first;
        if start_of_line {
            self.set_owner(file, &token)?;
            token = file.lex()?;
        } else if file.owner.is_none() {
            return Err(file.error(ErrorKind::Syntax(
                "no previous owner to continue from".into(),
            )));
        }

        // class and TTL, optional, in either order, before the type
        let mut ttl = None;
        let mut class = None;
        loop {
            if token.is_end() {
                return Err(file.error(ErrorKind::Syntax("missing record type".into())));
            }
            if token.kind == TokenKind::Contiguous {
                let bytes = file.bytes(&token);
                if ttl.is_none() && bytes.first().is_some_and(u8::is_ascii_digit) {
                    let value = rdata::ttl(bytes, self.options.pretty_ttl)
                        .map_err(|e| self.ttl_error(file, e))?;
                    ttl = Some(value);
                    token = file.lex()?;
                    continue;
                }
                if class.is_none() {
                    let found = mnemonic::find_class(bytes).or_else(|| {
                        if self.options.accept_unknown_rrtype {
                            mnemonic::prefixed_number(b"CLASS", bytes)
                        } else {
                            None
                        }
                    });
                    if let Some(code) = found {
                        class = Some(code);
                        token = file.lex()?;
                        continue;
                    }
                }
            }
            break;
        }

        let (rtype, info) = self.scan_type(file, &token)?;
        let ttl = match ttl.or(self.default_ttl) {
            Some(value) => value,
            None => {
                return Err(file.error(ErrorKind::Semantic(
                    "record omits TTL and no $TTL or default is in effect".into(),
                )));
            }
        };
        let class = class.unwrap_or(self.options.default_class);
        if ttl > i32::MAX as u32 {
            // RFC 2181 §8: TTLs are 31-bit; resolvers read the high bit as zero
            warn!(file = %file.path, line = file.lexer.line(), ttl, "TTL exceeds 2^31-1");
        }

        self.rdata.clear();
        self.encode_rdata(file, info)?;

        let owner = match &file.owner {
            Some(owner) => owner,
            None => return Err(file.error(ErrorKind::Syntax("record without owner".into()))),
        };
        let record = Record {
            owner: owner.as_slice(),
            ttl,
            class,
            rtype,
            rdata: self.rdata.as_slice(),
        };
        *count += 1;
        match sink.record(&record) {
            ControlFlow::Continue(()) => Ok(Flow::Continue),
            ControlFlow::Break(()) => Ok(Flow::Cancel),
        }
    }

    fn ttl_error(&self, file: &File, e: EncodeError) -> ParseError {
        match e {
            EncodeError::Semantic => file.error(ErrorKind::Semantic("TTL out of range".into())),
            _ => file.error(ErrorKind::Syntax("invalid TTL".into())),
        }
    }

    fn set_owner(&self, file: &mut File, token: &Token) -> Result<(), ParseError> {
        let bytes = file.bytes(token);
        let owner = if token.kind == TokenKind::Contiguous && bytes == b"@" {
            match file.origin {
                Some(origin) => origin,
                None => {
                    return Err(
                        file.error(ErrorKind::Semantic("@ used without an origin".into()))
                    );
                }
            }
        } else {
            name::encode(bytes, file.origin.as_ref())
                .map_err(|e| file.error(name_error("owner", e)))?
        };
        file.owner = Some(owner);
        Ok(())
    }

    fn directive(&mut self, file: &mut File, token: &Token) -> Result<Flow, ParseError> {
        let directive = file.bytes(token).to_vec();
        if directive.eq_ignore_ascii_case(b"$ORIGIN") {
            let name_token = file.lex()?;
            if !name_token.is_content() {
                return Err(
                    file.error(ErrorKind::Syntax("missing domain name after $ORIGIN".into()))
                );
            }
            let origin = name::encode(file.bytes(&name_token), None).map_err(|e| {
                file.error(match e {
                    NameError::RelativeWithoutOrigin => {
                        ErrorKind::Semantic("$ORIGIN must be absolute".into())
                    }
                    other => {
                        ErrorKind::Syntax(format!("invalid $ORIGIN: {}", other.describe()))
                    }
                })
            })?;
            file.origin = Some(origin);
            self.end_of_entry(file, "$ORIGIN")?;
            Ok(Flow::Continue)
        } else if directive.eq_ignore_ascii_case(b"$TTL") {
            let ttl_token = file.lex()?;
            if ttl_token.kind != TokenKind::Contiguous {
                return Err(file.error(ErrorKind::Syntax("missing duration after $TTL".into())));
            }
            let value = rdata::ttl(file.bytes(&ttl_token), self.options.pretty_ttl)
                .map_err(|e| self.ttl_error(file, e))?;
            self.default_ttl = Some(value);
            self.end_of_entry(file, "$TTL")?;
            Ok(Flow::Continue)
        } else if directive.eq_ignore_ascii_case(b"$INCLUDE") {
            self.include(file)
        } else {
            let name = String::from_utf8_lossy(&directive).into_owned();
            Err(file.error(ErrorKind::Syntax(format!("unknown directive {name}"))))
        }
    }

    fn include(&mut self, file: &mut File) -> Result<Flow, ParseError> {
        if !self.options.allow_includes {
            return Err(file.error(ErrorKind::NotPermitted));
        }
        let path_token = file.lex()?;
        if !path_token.is_content() {
            return Err(file.error(ErrorKind::Syntax("missing path after $INCLUDE".into())));
        }
        let raw = file.bytes(&path_token);
        let mut path_bytes = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'\\' {
                let (byte, used) = name::unescape(&raw[i..])
                    .map_err(|e| file.error(name_error("$INCLUDE path", e)))?;
                path_bytes.push(byte);
                i += used;
            } else {
                path_bytes.push(raw[i]);
                i += 1;
            }
        }
        let path_text = String::from_utf8(path_bytes).map_err(|_| {
            file.error(ErrorKind::Syntax("$INCLUDE path is not valid UTF-8".into()))
        })?;

        let next = file.lex()?;
        let origin = if next.is_content() {
            let origin = name::encode(file.bytes(&next), None).map_err(|e| {
                file.error(match e {
                    NameError::RelativeWithoutOrigin => {
                        ErrorKind::Semantic("$INCLUDE origin must be absolute".into())
                    }
                    other => ErrorKind::Syntax(format!(
                        "invalid $INCLUDE origin: {}",
                        other.describe()
                    )),
                })
            })?;
            self.end_of_entry(file, "$INCLUDE")?;
            Some(origin)
        } else {
            file.origin
        };

        let resolved = if Path::new(&path_text).is_absolute() {
            PathBuf::from(&path_text)
        } else {
            file.dir.join(&path_text)
        };
        let child = self.open(&resolved, origin).map_err(|kind| file.error(kind))?;
        Ok(Flow::Push(child))
    }

    fn end_of_entry(&self, file: &mut File, what: &str) -> Result<(), ParseError> {
        let token = file.lex()?;
        if !token.is_end() {
            return Err(file.error(ErrorKind::Syntax(format!("trailing data after {what}"))));
        }
        Ok(())
    }

    fn scan_type(
        &self,
        file: &File,
        token: &Token,
    ) -> Result<(u16, Option<&'static TypeInfo>), ParseError> {
        if token.kind != TokenKind::Contiguous {
            return Err(file.error(ErrorKind::Syntax("expected a record type".into())));
        }
        let bytes = file.bytes(token);
        if let Some(info) = mnemonic::find_type(bytes) {
            return Ok((info.code, Some(info)));
        }
        if self.options.accept_unknown_rrtype {
            if let Some(code) = mnemonic::prefixed_number(b"TYPE", bytes) {
                return Ok((code, types::by_code(code)));
            }
        }
        Err(file.error(ErrorKind::UnsupportedType(
            String::from_utf8_lossy(bytes).into_owned(),
        )))
    }

    fn type_code_of(&self, bytes: &[u8]) -> Option<u16> {
        if let Some(info) = mnemonic::find_type(bytes) {
            return Some(info.code);
        }
        if self.options.accept_unknown_rrtype {
            return mnemonic::prefixed_number(b"TYPE", bytes);
        }
        None
    }

    fn encode_rdata(
        &mut self,
        file: &mut File,
        info: Option<&'static TypeInfo>,
    ) -> Result<(), ParseError> {
        let mut token = file.lex()?;

        if token.kind == TokenKind::Contiguous && file.bytes(&token) == b"\\#" {
            if !self.options.accept_unknown_rrtype {
                return Err(file.error(ErrorKind::Syntax(
                    "generic RDATA is not permitted".into(),
                )));
            }
            return self.generic_rdata(file);
        }
        let Some(info) = info else {
            return Err(file.error(ErrorKind::Syntax(
                "unknown type requires the \\# generic RDATA form".into(),
            )));
        };

        let field_count = info.fields.len();
        for (i, field) in info.fields.iter().enumerate() {
            if field.kind.is_greedy() {
                debug_assert_eq!(i + 1, field_count);
                return self.greedy(file, info, field, token);
            }
            if token.is_end() {
                return Err(file.missing(info, field));
            }
            self.single(file, info, field, &token)?;
            token = file.lex()?;
        }
        if !token.is_end() {
            return Err(file.error(ErrorKind::Syntax(format!(
                "trailing data in {} record",
                info.name
            ))));
        }
        Ok(())
    }

    /// Generic RDATA (RFC 3597): `\# length hex…`, hex possibly grouped.
    fn generic_rdata(&mut self, file: &mut File) -> Result<(), ParseError> {
        let length_token = file.lex()?;
        if length_token.kind != TokenKind::Contiguous {
            return Err(file.error(ErrorKind::Syntax("missing generic RDATA length".into())));
        }
        let expected = rdata::decimal(file.bytes(&length_token), u64::from(u16::MAX))
            .map_err(|e| {
                file.error(match e {
                    EncodeError::Semantic => {
                        ErrorKind::Semantic("generic RDATA length out of range".into())
                    }
                    _ => ErrorKind::Syntax("invalid generic RDATA length".into()),
                })
            })? as usize;

        let mut decoder = rdata::base::Base16::default();
        let mut token = file.lex()?;
        while token.kind == TokenKind::Contiguous {
            decoder
                .feed(file.bytes(&token), &mut self.rdata)
                .map_err(|_| file.error(ErrorKind::Syntax("invalid generic RDATA".into())))?;
            token = file.lex()?;
        }
        if !token.is_end() {
            return Err(file.error(ErrorKind::Syntax("invalid generic RDATA".into())));
        }
        decoder
            .finish()
            .map_err(|_| file.error(ErrorKind::Syntax("invalid generic RDATA".into())))?;
        if self.rdata.len() != expected {
            return Err(file.error(ErrorKind::Semantic(
                "generic RDATA length does not match the data".into(),
            )));
        }
        Ok(())
    }

    /// Encode one single-token field.
    fn single(
        &mut self,
        file: &mut File,
        ty: &'static TypeInfo,
        field: &'static FieldInfo,
        token: &Token,
    ) -> Result<(), ParseError> {
        let contiguous = token.kind == TokenKind::Contiguous;
        match field.kind {
            FieldKind::Name => {
                let bytes = file.bytes(token);
                let name = if contiguous && bytes == b"@" {
                    match file.origin {
                        Some(origin) => origin,
                        None => {
                            return Err(file
                                .error(ErrorKind::Semantic("@ used without an origin".into())));
                        }
                    }
                } else {
                    name::encode(bytes, file.origin.as_ref())
                        .map_err(|e| file.error(name_error(field.name, e)))?
                };
                self.rdata
                    .write(name.as_slice())
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Int8 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let value = rdata::decimal(file.bytes(token), 255)
                    .map_err(|e| file.invalid(ty, field, e))?;
                self.rdata.write_u8(value as u8).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Int16 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let value = rdata::decimal(file.bytes(token), 65_535)
                    .map_err(|e| file.invalid(ty, field, e))?;
                self.rdata.write_u16(value as u16).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Int32 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let value = rdata::decimal(file.bytes(token), u64::from(u32::MAX))
                    .map_err(|e| file.invalid(ty, field, e))?;
                self.rdata.write_u32(value as u32).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Ttl => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let value = rdata::ttl(file.bytes(token), self.options.pretty_ttl)
                    .map_err(|e| file.invalid(ty, field, e))?;
                self.rdata.write_u32(value).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Time => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                rdata::time::parse(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Ip4 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Semantic));
                }
                rdata::ip::parse_ip4(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Ip6 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Semantic));
                }
                rdata::ip::parse_ip6(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::TypeCode => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let code = self
                    .type_code_of(file.bytes(token))
                    .ok_or_else(|| file.invalid(ty, field, EncodeError::Syntax))?;
                self.rdata.write_u16(code).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Algorithm => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let bytes = file.bytes(token);
                let code = if bytes.first().is_some_and(u8::is_ascii_digit) {
                    rdata::decimal(bytes, 255).map_err(|e| file.invalid(ty, field, e))? as u8
                } else {
                    mnemonic::find_algorithm(bytes)
                        .ok_or_else(|| file.invalid(ty, field, EncodeError::Syntax))?
                        .code as u8
                };
                self.rdata.write_u8(code).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::CertType => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let bytes = file.bytes(token);
                let code = if bytes.first().is_some_and(u8::is_ascii_digit) {
                    if bytes.len() > 1 && bytes[0] == b'0' {
                        return Err(file.invalid(ty, field, EncodeError::Syntax));
                    }
                    rdata::decimal(bytes, 65_535).map_err(|e| file.invalid(ty, field, e))?
                        as u16
                } else {
                    mnemonic::find_cert_type(bytes)
                        .ok_or_else(|| file.invalid(ty, field, EncodeError::Syntax))?
                        .code
                };
                self.rdata.write_u16(code).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Protocol => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let bytes = file.bytes(token);
                let code = match mnemonic::find_protocol(bytes) {
                    Some(code) => code,
                    None => rdata::decimal(bytes, 255)
                        .map_err(|e| file.invalid(ty, field, e))? as u8,
                };
                self.rdata.write_u8(code).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::CaaTag => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                let bytes = file.bytes(token);
                if bytes.is_empty()
                    || bytes.len() > 15
                    || !bytes.iter().all(u8::is_ascii_alphanumeric)
                {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                self.rdata.write_u8(bytes.len() as u8).map_err(|e| file.invalid(ty, field, e))?;
                self.rdata.write(bytes).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::String => {
                rdata::text::string(file.lexer.data(), token.start, token.len, &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Remainder => {
                rdata::text::remainder(
                    file.lexer.data(),
                    token.start,
                    token.len,
                    &mut self.rdata,
                )
                .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Salt => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                rdata::base::salt(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Base32 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                rdata::base::base32_prefixed(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Eui48 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                rdata::eui::parse_eui48(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Eui64 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                rdata::eui::parse_eui64(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Ilnp64 => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                rdata::ip::parse_ilnp64(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Nsap => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                rdata::ip::parse_nsap(file.bytes(token), &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::IpsecGateway => {
                if !contiguous {
                    return Err(file.invalid(ty, field, EncodeError::Syntax));
                }
                // the gateway-type field was encoded one byte earlier
                let gateway_type = self.rdata.byte_at(1).unwrap_or(0);
                let bytes = file.bytes(token);
                match gateway_type {
                    0 => {
                        if bytes != b"." {
                            return Err(file.invalid(ty, field, EncodeError::Syntax));
                        }
                    }
                    1 => rdata::ip::parse_ip4(bytes, &mut self.rdata)
                        .map_err(|e| file.invalid(ty, field, e))?,
                    2 => rdata::ip::parse_ip6(bytes, &mut self.rdata)
                        .map_err(|e| file.invalid(ty, field, e))?,
                    3 => {
                        let name = name::encode(bytes, file.origin.as_ref())
                            .map_err(|e| file.error(name_error(field.name, e)))?;
                        self.rdata
                            .write(name.as_slice())
                            .map_err(|e| file.invalid(ty, field, e))?;
                    }
                    _ => return Err(file.invalid(ty, field, EncodeError::Semantic)),
                }
            }
            // greedy kinds are dispatched in encode_rdata
            FieldKind::StringOpt
            | FieldKind::StringSeq
            | FieldKind::Base16Seq
            | FieldKind::Base64Seq
            | FieldKind::Base64Opt
            | FieldKind::NsecBitmap
            | FieldKind::NxtBitmap
            | FieldKind::WksServices
            | FieldKind::SvcbParams
            | FieldKind::Apl
            | FieldKind::Loc => unreachable!("greedy field kind in single-token dispatch"),
        }
        Ok(())
    }

    /// Encode the final, token-consuming field, through the delimiter.
    fn greedy(
        &mut self,
        file: &mut File,
        ty: &'static TypeInfo,
        field: &'static FieldInfo,
        first: Token,
    ) -> Result<(), ParseError> {
        let mut token = first;
        match field.kind {
            FieldKind::StringSeq => {
                if token.is_end() {
                    return Err(file.missing(ty, field));
                }
                while token.is_content() {
                    rdata::text::string(
                        file.lexer.data(),
                        token.start,
                        token.len,
                        &mut self.rdata,
                    )
                    .map_err(|e| file.invalid(ty, field, e))?;
                    token = file.lex()?;
                }
            }
            FieldKind::StringOpt => {
                if token.is_content() {
                    rdata::text::string(
                        file.lexer.data(),
                        token.start,
                        token.len,
                        &mut self.rdata,
                    )
                    .map_err(|e| file.invalid(ty, field, e))?;
                    token = file.lex()?;
                }
            }
            FieldKind::Base16Seq => {
                if token.is_end() {
                    return Err(file.missing(ty, field));
                }
                let mut decoder = rdata::base::Base16::default();
                while token.kind == TokenKind::Contiguous {
                    decoder
                        .feed(file.bytes(&token), &mut self.rdata)
                        .map_err(|e| file.invalid(ty, field, e))?;
                    token = file.lex()?;
                }
                decoder.finish().map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Base64Seq | FieldKind::Base64Opt => {
                if token.is_end() {
                    if field.kind == FieldKind::Base64Seq {
                        return Err(file.missing(ty, field));
                    }
                } else {
                    let mut decoder = rdata::base::Base64::default();
                    while token.kind == TokenKind::Contiguous {
                        decoder
                            .feed(file.bytes(&token), &mut self.rdata)
                            .map_err(|e| file.invalid(ty, field, e))?;
                        token = file.lex()?;
                    }
                    decoder.finish().map_err(|e| file.invalid(ty, field, e))?;
                }
            }
            FieldKind::NsecBitmap => {
                if token.is_end() {
                    return Err(file.missing(ty, field));
                }
                self.nsec.begin();
                while token.kind == TokenKind::Contiguous {
                    let code = self
                        .type_code_of(file.bytes(&token))
                        .ok_or_else(|| file.invalid(ty, field, EncodeError::Syntax))?;
                    self.nsec.add(code);
                    token = file.lex()?;
                }
                self.nsec.finish(&mut self.rdata).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::NxtBitmap => {
                self.nxt.begin();
                while token.kind == TokenKind::Contiguous {
                    let code = self
                        .type_code_of(file.bytes(&token))
                        .ok_or_else(|| file.invalid(ty, field, EncodeError::Syntax))?;
                    self.nxt.add(code).map_err(|e| file.invalid(ty, field, e))?;
                    token = file.lex()?;
                }
                self.nxt.finish(&mut self.rdata).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::WksServices => {
                self.wks.begin();
                while token.kind == TokenKind::Contiguous {
                    let bytes = file.bytes(&token);
                    let port = if bytes.first().is_some_and(u8::is_ascii_digit) {
                        rdata::decimal(bytes, 65_535)
                            .map_err(|e| file.invalid(ty, field, e))? as u16
                    } else {
                        mnemonic::find_service(bytes)
                            .ok_or_else(|| file.invalid(ty, field, EncodeError::Syntax))?
                            .code
                    };
                    self.wks.add(port);
                    token = file.lex()?;
                }
                self.wks.finish(&mut self.rdata).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::SvcbParams => {
                self.svcb.begin();
                while token.is_content() {
                    if token.kind != TokenKind::Contiguous {
                        return Err(file.invalid(ty, field, EncodeError::Syntax));
                    }
                    let fed = self
                        .svcb
                        .add_token(file.bytes(&token))
                        .map_err(|e| file.invalid(ty, field, e))?;
                    if fed == rdata::svcb::Fed::NeedValue {
                        let value = file.lex()?;
                        if !value.is_content() {
                            return Err(file.invalid(ty, field, EncodeError::Syntax));
                        }
                        self.svcb
                            .add_value(file.bytes(&value))
                            .map_err(|e| file.invalid(ty, field, e))?;
                    }
                    token = file.lex()?;
                }
                self.svcb.finish(&mut self.rdata).map_err(|e| file.invalid(ty, field, e))?;
            }
            FieldKind::Apl => {
                while token.kind == TokenKind::Contiguous {
                    rdata::apl::encode_item(file.bytes(&token), &mut self.rdata)
                        .map_err(|e| file.invalid(ty, field, e))?;
                    token = file.lex()?;
                }
            }
            FieldKind::Loc => {
                if token.is_end() {
                    return Err(file.missing(ty, field));
                }
                self.loc_tokens.clear();
                while token.is_content() {
                    self.loc_tokens.push(file.bytes(&token).to_vec());
                    token = file.lex()?;
                }
                rdata::loc::encode(&self.loc_tokens, &mut self.rdata)
                    .map_err(|e| file.invalid(ty, field, e))?;
            }
            _ => unreachable!("single-token field kind in greedy dispatch"),
        }
        if !token.is_end() {
            return Err(file.error(ErrorKind::Syntax(format!(
                "trailing data in {} record",
                ty.name
            ))));
        }
        Ok(())
    }
}

fn name_error(what: &str, e: NameError) -> ErrorKind {
    match e {
        NameError::RelativeWithoutOrigin => {
            ErrorKind::Semantic(format!("{what}: {}", e.describe()))
        }
        other => ErrorKind::Syntax(format!("invalid {what}: {}", other.describe())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Row = (Vec<u8>, u32, u16, u16, Vec<u8>);

    struct Collect(Vec<Row>);

    impl Sink for Collect {
        fn record(&mut self, record: &Record<'_>) -> ControlFlow<()> {
            self.0.push((
                record.owner.to_vec(),
                record.ttl,
                record.class,
                record.rtype,
                record.rdata.to_vec(),
            ));
            ControlFlow::Continue(())
        }
    }

    fn parse_with(options: Options, text: &str) -> Result<Vec<Row>, ParseError> {
        let mut parser = Parser::new(options).unwrap();
        let mut sink = Collect(Vec::new());
        parser.parse_str("<test>", text, &mut sink)?;
        Ok(sink.0)
    }

    fn parse(text: &str) -> Result<Vec<Row>, ParseError> {
        parse_with(Options::default(), text)
    }

    fn wire_name(text: &str) -> Vec<u8> {
        name::encode(text.as_bytes(), None).unwrap().as_slice().to_vec()
    }

    #[test]
    fn a_record() {
        let records = parse("example.com. 300 IN A 192.0.2.1\n").unwrap();
        assert_eq!(
            records,
            vec![(wire_name("example.com."), 300, 1, 1, vec![192, 0, 2, 1])]
        );
    }

    #[test]
    fn wks_with_mnemonic_protocol_and_service() {
        let records = parse("foo. 1s IN WKS 192.168.0.1 TCP smtp\n").unwrap();
        let (_, ttl, class, rtype, rdata) = &records[0];
        assert_eq!((*ttl, *class, *rtype), (1, 1, 11));
        assert_eq!(rdata, &vec![192, 168, 0, 1, 6, 0x00, 0x00, 0x00, 0x40]);
    }

    #[test]
    fn wks_numeric_forms_and_port_edges() {
        let records = parse("foo. 1 IN WKS 192.168.0.1 6 25 7 8\n").unwrap();
        assert_eq!(records[0].4, vec![192, 168, 0, 1, 6, 0x01, 0x80, 0x00, 0x40]);
        assert!(parse("foo. 1 IN WKS 192.168.0.1 TCP 65536\n").is_err());
    }

    #[test]
    fn nsec_record_ends_at_eof() {
        let records = parse("bar.foo. 1s IN NSEC baz.foo. A NSEC").unwrap();
        let mut expected = wire_name("baz.foo.");
        expected.extend_from_slice(&[0x00, 0x06, 0x40, 0x00, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(records[0].3, 47);
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn origin_ttl_and_blank_owner_continuation() {
        let records = parse(
            "$ORIGIN example.com.\n\
             $TTL 1h\n\
             www A 192.0.2.1\n\
             \tA 192.0.2.2\n",
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        let owner = wire_name("www.example.com.");
        assert_eq!(records[0], (owner.clone(), 3600, 1, 1, vec![192, 0, 2, 1]));
        assert_eq!(records[1], (owner, 3600, 1, 1, vec![192, 0, 2, 2]));
    }

    #[test]
    fn class_and_ttl_in_either_order() {
        let mut expected = vec![0, 10];
        expected.extend_from_slice(&wire_name("mail.x."));
        let a = parse("x. IN 300 MX 10 mail.x.\n").unwrap();
        let b = parse("x. 300 IN MX 10 mail.x.\n").unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].1, 300);
        assert_eq!(a[0].4, expected);
    }

    #[test]
    fn missing_ttl_is_a_semantic_error() {
        let err = parse("x. IN A 192.0.2.1\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Semantic(_)), "{err}");
    }

    #[test]
    fn at_sign_owner_uses_the_origin() {
        let options = Options { origin: Some("example.com.".into()), ..Options::default() };
        let records = parse_with(options, "@ 60 IN NS ns\n").unwrap();
        assert_eq!(records[0].0, wire_name("example.com."));
        assert_eq!(records[0].4, wire_name("ns.example.com."));
    }

    #[test]
    fn soa_with_grouping_and_comments() {
        let options = Options { origin: Some("example.com.".into()), ..Options::default() };
        let records = parse_with(
            options,
            "@ 3600 IN SOA ns hostmaster ( ; authority\n\
             \t2024010101 ; serial\n\
             \t7200 3600 1209600 300 )\n",
        )
        .unwrap();
        let mut expected = wire_name("ns.example.com.");
        expected.extend_from_slice(&wire_name("hostmaster.example.com."));
        for value in [2024010101u32, 7200, 3600, 1209600, 300] {
            expected.extend_from_slice(&value.to_be_bytes());
        }
        assert_eq!(records[0].3, 6);
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn txt_strings_and_escapes() {
        let records = parse("t. 1 IN TXT \"a\\092b\"\n").unwrap();
        assert_eq!(records[0].4, vec![3, 0x61, 0x5c, 0x62]);

        let records = parse("t. 1 IN TXT abc \"d e\"\n").unwrap();
        assert_eq!(records[0].4, b"\x03abc\x04d e".to_vec());
    }

    #[test]
    fn srv_record() {
        let records =
            parse("_sip._tcp.example.com. 86400 IN SRV 0 5 5060 sip.example.com.\n").unwrap();
        let mut expected = vec![0, 0, 0, 5, 0x13, 0xc4];
        expected.extend_from_slice(&wire_name("sip.example.com."));
        assert_eq!(records[0].3, 33);
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn rrsig_record() {
        let records = parse(
            "example.com. 3600 IN RRSIG A RSASHA256 2 3600 \
             20230101000000 20221201000000 12345 example.com. Zm9vYmFy\n",
        )
        .unwrap();
        let mut expected = vec![0, 1, 8, 2];
        expected.extend_from_slice(&3600u32.to_be_bytes());
        expected.extend_from_slice(&1_672_531_200u32.to_be_bytes());
        expected.extend_from_slice(&1_669_852_800u32.to_be_bytes());
        expected.extend_from_slice(&12345u16.to_be_bytes());
        expected.extend_from_slice(&wire_name("example.com."));
        expected.extend_from_slice(b"foobar");
        assert_eq!(records[0].3, 46);
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn dnskey_base64_spans_grouped_pieces() {
        let grouped = parse("x. 1 IN DNSKEY 256 3 8 ( Zm9v\n YmFy )\n").unwrap();
        let flat = parse("x. 1 IN DNSKEY 256 3 8 Zm9vYmFy\n").unwrap();
        assert_eq!(grouped, flat);
        assert_eq!(&grouped[0].4[4..], b"foobar");
    }

    #[test]
    fn nsec3_record() {
        let records = parse("x. 1 IN NSEC3 1 0 0 - CPNMUOJ1 A\n").unwrap();
        let mut expected = vec![1, 0, 0, 0, 0, 5];
        expected.extend_from_slice(b"fooba");
        expected.extend_from_slice(&[0x00, 0x01, 0x40]);
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn ds_record_hex_digest() {
        let records =
            parse("x. 1 IN DS 60485 RSASHA1 1 2BB183AF5F22588179A53B0A98631FAD1A292118\n")
                .unwrap();
        let mut expected = vec![0xec, 0x45, 5, 1];
        expected.extend_from_slice(&[
            0x2b, 0xb1, 0x83, 0xaf, 0x5f, 0x22, 0x58, 0x81, 0x79, 0xa5, 0x3b, 0x0a, 0x98,
            0x63, 0x1f, 0xad, 0x1a, 0x29, 0x21, 0x18,
        ]);
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn caa_record() {
        let records = parse("x. 1 IN CAA 0 issue \"ca.example.net\"\n").unwrap();
        let mut expected = vec![0, 5];
        expected.extend_from_slice(b"issue");
        expected.extend_from_slice(b"ca.example.net");
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn https_record_with_params() {
        let records = parse("example.com. 1 IN HTTPS 1 . alpn=h2 port=8443\n").unwrap();
        let expected = vec![
            0x00, 0x01, // priority
            0x00, // root target
            0x00, 0x01, 0x00, 0x03, 0x02, b'h', b'2', // alpn
            0x00, 0x03, 0x00, 0x02, 0x20, 0xfb, // port
        ];
        assert_eq!(records[0].3, 65);
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn eui48_record_and_error() {
        let records = parse("x. 1 IN EUI48 00-11-22-33-44-55\n").unwrap();
        assert_eq!(records[0].4, vec![0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

        let err = parse("x. 1 IN EUI48 00+11-22-33-44-55\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Syntax(_)), "{err}");
    }

    #[test]
    fn loc_record() {
        let records = parse("x. 1 IN LOC 42 21 54 N 71 06 18 W -24m\n").unwrap();
        let lat = 2u32.pow(31) + (42 * 3600 + 21 * 60 + 54) * 1000;
        let lon = 2u32.pow(31) - (71 * 3600 + 6 * 60 + 18) * 1000;
        let alt: i32 = 10_000_000 - 2400;
        let mut expected = vec![0x00, 0x12, 0x16, 0x13];
        expected.extend_from_slice(&lat.to_be_bytes());
        expected.extend_from_slice(&lon.to_be_bytes());
        expected.extend_from_slice(&alt.to_be_bytes());
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn generic_rdata_forms() {
        let records = parse("x. 1 IN TYPE1000 \\# 3 abcdef\n").unwrap();
        assert_eq!(records[0].3, 1000);
        assert_eq!(records[0].4, vec![0xab, 0xcd, 0xef]);

        // TYPEnn naming a known type takes its normal syntax
        let records = parse("x. 1 IN TYPE1 192.0.2.1\n").unwrap();
        assert_eq!(records[0].3, 1);
        assert_eq!(records[0].4, vec![192, 0, 2, 1]);

        // and the generic form works for known types too
        let records = parse("x. 1 IN A \\# 4 c0000201\n").unwrap();
        assert_eq!(records[0].4, vec![0xc0, 0x00, 0x02, 0x01]);

        let err = parse("x. 1 IN TYPE1000 \\# 2 abcdef\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Semantic(_)), "{err}");
    }

    #[test]
    fn unknown_types_are_rejected() {
        let err = parse("x. 1 IN FROB 1\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedType(_)), "{err}");

        let options = Options { accept_unknown_rrtype: false, ..Options::default() };
        let err = parse_with(options, "x. 1 IN TYPE12 foo.\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedType(_)), "{err}");
    }

    #[test]
    fn grouping_violations() {
        let err = parse("x. 1 IN A ( ( 192.0.2.1 ) )\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NestedOpenBrace), "{err}");

        let err = parse("x. 1 IN A 192.0.2.1 )\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnmatchedCloseBrace), "{err}");
    }

    #[test]
    fn field_shape_errors() {
        let err = parse("x. 1 IN MX 10\n").unwrap_err();
        assert!(err.to_string().contains("missing hostname in MX record"), "{err}");

        let err = parse("x. 1 IN A 192.0.2.1 extra\n").unwrap_err();
        assert!(err.to_string().contains("trailing data"), "{err}");
    }

    #[test]
    fn error_locations_point_at_the_line() {
        let err = parse("good. 1 IN A 192.0.2.1\nbad. 1 IN A not-an-address\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.file, "<test>");
    }

    #[test]
    fn refill_boundaries_do_not_change_results() {
        let text = "\
$ORIGIN example.com.\n\
$TTL 300\n\
www A 192.0.2.1\n\
txt TXT \"some reasonably long text record content here\" more pieces\n\
key DNSKEY 256 3 8 ( Zm9vYmFyYmF6cXV4cXV1eA==\n )\n\
mail MX 10 mail\n";
        let reference = parse(text).unwrap();
        for window in [64usize, 128, 256] {
            let options = Options { window_size: window, ..Options::default() };
            assert_eq!(parse_with(options, text).unwrap(), reference, "window {window}");
        }
    }

    #[test]
    fn canonical_reencoding_roundtrips() {
        // re-render the wire RDATA of easily printable types in canonical
        // text and parse that; the second pass must produce identical bytes
        let records = parse(
            "a.example. 60 IN A 192.0.2.7\n\
             b.example. 60 IN AAAA 2001:db8::7\n\
             c.example. 60 IN TXT \"plain text\"\n",
        )
        .unwrap();
        for (i, (_, _, _, rtype, rdata)) in records.iter().enumerate() {
            let text = match *rtype {
                1 => {
                    let octets: [u8; 4] = rdata.as_slice().try_into().unwrap();
                    std::net::Ipv4Addr::from(octets).to_string()
                }
                28 => {
                    let octets: [u8; 16] = rdata.as_slice().try_into().unwrap();
                    std::net::Ipv6Addr::from(octets).to_string()
                }
                16 => format!(
                    "\"{}\"",
                    std::str::from_utf8(&rdata[1..]).unwrap()
                ),
                other => panic!("unexpected type {other}"),
            };
            let again = parse(&format!("x. 60 IN TYPE{rtype} {text}\n")).unwrap();
            assert_eq!(&again[0].4, rdata, "record {i}");
        }
    }

    #[test]
    fn cancellation_stops_after_the_current_record() {
        struct StopAfterOne(u64);
        impl Sink for StopAfterOne {
            fn record(&mut self, _: &Record<'_>) -> ControlFlow<()> {
                self.0 += 1;
                ControlFlow::Break(())
            }
        }
        let mut parser = Parser::new(Options::default()).unwrap();
        let mut sink = StopAfterOne(0);
        let count = parser
            .parse_str("<test>", "a. 1 IN A 192.0.2.1\nb. 1 IN A 192.0.2.2\n", &mut sink)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(sink.0, 1);
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zf-zone-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn includes_inherit_and_revert_origin() {
        let dir = scratch_dir("include");
        let inner = dir.join("inner.zone");
        std::fs::write(&inner, "www A 192.0.2.9\n").unwrap();
        let outer = dir.join("outer.zone");
        std::fs::write(
            &outer,
            "$ORIGIN example.com.\n$TTL 60\n$INCLUDE inner.zone sub.example.com.\nhost A 192.0.2.1\n",
        )
        .unwrap();

        let mut parser = Parser::new(Options::default()).unwrap();
        let mut sink = Collect(Vec::new());
        parser.parse_file(&outer, &mut sink).unwrap();
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[0].0, wire_name("www.sub.example.com."));
        assert_eq!(sink.0[1].0, wire_name("host.example.com."));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn recursive_includes_are_rejected() {
        let dir = scratch_dir("recurse");
        let zone = dir.join("self.zone");
        std::fs::write(&zone, "$ORIGIN x.\n$TTL 1\n$INCLUDE self.zone\n").unwrap();

        let mut parser = Parser::new(Options::default()).unwrap();
        let mut sink = Collect(Vec::new());
        let err = parser.parse_file(&zone, &mut sink).unwrap_err();
        assert!(err.to_string().contains("recursive"), "{err}");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn includes_can_be_disabled() {
        let options = Options { allow_includes: false, ..Options::default() };
        let err = parse_with(options, "$INCLUDE whatever.zone\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotPermitted), "{err}");
    }

    #[test]
    fn missing_include_file_is_not_a_file() {
        let err = parse("$INCLUDE /nonexistent/zf-zone-test.zone\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotAFile(_)), "{err}");
    }

    #[test]
    fn unknown_directives_are_rejected() {
        let err = parse("$GENERATE 1-10 host$ A 192.0.2.1\n").unwrap_err();
        assert!(err.to_string().contains("unknown directive"), "{err}");
    }

    #[test]
    fn quoted_owner_and_relative_rdata_names() {
        let options = Options { origin: Some("example.com.".into()), ..Options::default() };
        let records = parse_with(options, "\"www\" 60 IN CNAME web\n").unwrap();
        assert_eq!(records[0].0, wire_name("www.example.com."));
        assert_eq!(records[0].4, wire_name("web.example.com."));
    }

    #[test]
    fn ipseckey_gateway_shapes() {
        let records = parse("x. 1 IN IPSECKEY 10 0 2 . Zm9v\n").unwrap();
        assert_eq!(records[0].4, vec![10, 0, 2, b'f', b'o', b'o']);

        let records = parse("x. 1 IN IPSECKEY 10 1 2 192.0.2.3 Zm9v\n").unwrap();
        assert_eq!(records[0].4, vec![10, 1, 2, 192, 0, 2, 3, b'f', b'o', b'o']);

        let records = parse("x. 1 IN IPSECKEY 10 3 2 gw.example.com. Zm9v\n").unwrap();
        let mut expected = vec![10, 3, 2];
        expected.extend_from_slice(&wire_name("gw.example.com."));
        expected.extend_from_slice(b"foo");
        assert_eq!(records[0].4, expected);

        let err = parse("x. 1 IN IPSECKEY 10 7 2 . Zm9v\n").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Semantic(_)), "{err}");
    }

    #[test]
    fn uri_target_keeps_raw_bytes() {
        let records = parse("x. 1 IN URI 10 1 \"https://example.com/\"\n").unwrap();
        let mut expected = vec![0, 10, 0, 1];
        expected.extend_from_slice(b"https://example.com/");
        assert_eq!(records[0].4, expected);
    }

    #[test]
    fn csync_bitmap() {
        let records = parse("x. 1 IN CSYNC 66 3 A NS AAAA\n").unwrap();
        let mut expected = 66u32.to_be_bytes().to_vec();
        expected.extend_from_slice(&3u16.to_be_bytes());
        expected.extend_from_slice(&[0x00, 0x04, 0x60, 0x00, 0x00, 0x08]);
        assert_eq!(records[0].4, expected);
    }
}
