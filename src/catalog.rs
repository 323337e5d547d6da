//! Reading PROJ.4 style text catalogs.
//!
//! A catalog is a sequence of records of the form
//!
//! ```text
//! # NAD83 / BC Albers
//! <3005> +proj=aea +lat_1=50 +lat_2=58.5 +lat_0=45 +lon_0=-126 +x_0=1000000 +y_0=0 +ellps=GRS80 +units=m <>
//! ```
//!
//! `#` starts a comment that runs to the end of the line. Record names are
//! matched case-sensitively. Every lookup opens the catalog afresh and scans it
//! sequentially; no handle is kept between calls.
use crate::error::CatalogError;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Catalogs compiled into the crate, keyed by lowercase authority name.
const EMBEDDED: &[(&str, &str)] = &[
    ("epsg", include_str!("../nad/epsg")),
    ("esri", include_str!("../nad/esri")),
    ("world", include_str!("../nad/world")),
];

/// The catalog consulted by reverse lookups.
const EPSG: &str = "epsg";

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Word(String),
    Open,
    Close,
    Equals,
    Other(char),
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    line: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '+' | '\'' | '"' | ',' | '@')
}

/// Splits catalog text into tokens, one line at a time.
struct Scanner<R> {
    reader: R,
    buf: String,
    pos: usize,
    line: usize,
}

impl<R: BufRead> Scanner<R> {
    fn new(reader: R) -> Self {
        Scanner {
            reader,
            buf: String::new(),
            pos: 0,
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for Scanner<R> {
    type Item = io::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pos >= self.buf.len() {
                self.buf.clear();
                self.pos = 0;
                match self.reader.read_line(&mut self.buf) {
                    Ok(0) => return None,
                    Ok(_) => self.line += 1,
                    Err(e) => return Some(Err(e)),
                }
                continue;
            }
            let rest = &self.buf[self.pos..];
            let Some(c) = rest.chars().next() else {
                self.pos = self.buf.len();
                continue;
            };
            if c == '#' {
                self.pos = self.buf.len();
                continue;
            }
            if c.is_whitespace() {
                self.pos += c.len_utf8();
                continue;
            }
            let kind = if is_word_char(c) {
                let len = rest.find(|ch| !is_word_char(ch)).unwrap_or(rest.len());
                self.pos += len;
                TokenKind::Word(rest[..len].to_string())
            } else {
                self.pos += c.len_utf8();
                match c {
                    '<' => TokenKind::Open,
                    '>' => TokenKind::Close,
                    '=' => TokenKind::Equals,
                    other => TokenKind::Other(other),
                }
            };
            return Some(Ok(Token {
                kind,
                line: self.line,
            }));
        }
    }
}

/// A single named record read from a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    /// 1-based line on which the record header starts.
    pub line: usize,
    /// Parameters in canonical `+key` / `+key=value` form.
    pub parameters: Vec<String>,
}

/// Lazily parses the records of a catalog.
///
/// Iteration stops at the end of the input, at the first token that does not
/// open a record, or after the first error.
pub struct Records<R> {
    tokens: Scanner<R>,
    current: Option<Token>,
    source: PathBuf,
    started: bool,
    done: bool,
}

/// Iterate over the records of a catalog. `source` is only used in error reports.
pub fn records<R: BufRead>(reader: R, source: impl Into<PathBuf>) -> Records<R> {
    Records {
        tokens: Scanner::new(reader),
        current: None,
        source: source.into(),
        started: false,
        done: false,
    }
}

fn canonical_parameter(key: &str, value: Option<&str>) -> String {
    let mut param = String::with_capacity(key.len() + 1);
    if !key.starts_with('+') {
        param.push('+');
    }
    param.push_str(key);
    if let Some(value) = value {
        param.push('=');
        param.push_str(value);
    }
    param
}

impl<R: BufRead> Records<R> {
    fn advance(&mut self) -> Result<(), CatalogError> {
        self.current = self
            .tokens
            .next()
            .transpose()
            .map_err(|source| CatalogError::Io {
                path: self.source.clone(),
                source,
            })?;
        Ok(())
    }

    fn current_is(&self, kind: &TokenKind) -> bool {
        self.current.as_ref().is_some_and(|t| &t.kind == kind)
    }

    fn error(&self, message: &str) -> CatalogError {
        let line = self
            .current
            .as_ref()
            .map(|t| t.line)
            .unwrap_or(self.tokens.line);
        CatalogError::Parse {
            line,
            message: message.to_string(),
        }
    }

    fn expect_word(&mut self, message: &str) -> Result<String, CatalogError> {
        match &self.current {
            Some(Token {
                kind: TokenKind::Word(word),
                ..
            }) => {
                let word = word.clone();
                self.advance()?;
                Ok(word)
            }
            _ => Err(self.error(message)),
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<(), CatalogError> {
        if !self.current_is(kind) {
            return Err(self.error(message));
        }
        self.advance()
    }

    /// Parse one record; the current token is the opening `<`.
    fn parse_record(&mut self) -> Result<Record, CatalogError> {
        let line = self.current.as_ref().map(|t| t.line).unwrap_or(self.tokens.line);
        self.advance()?;
        let name = self.expect_word("Word expected after '<'")?;
        self.expect(&TokenKind::Close, "'>' expected")?;

        let mut parameters = Vec::new();
        while !self.current_is(&TokenKind::Open) {
            let key = self.expect_word("Word expected after '+'")?;
            if self.current_is(&TokenKind::Equals) {
                self.advance()?;
                let value = self.expect_word("Value expected after '='")?;
                parameters.push(canonical_parameter(&key, Some(&value)));
            } else {
                parameters.push(canonical_parameter(&key, None));
            }
        }
        self.advance()?;
        self.expect(&TokenKind::Close, "'<>' expected")?;
        Ok(Record {
            name,
            line,
            parameters,
        })
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<Record, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            if let Err(e) = self.advance() {
                self.done = true;
                return Some(Err(e));
            }
        }
        if !self.current_is(&TokenKind::Open) {
            self.done = true;
            return None;
        }
        let record = self.parse_record();
        if record.is_err() {
            self.done = true;
        }
        Some(record)
    }
}

/// Scan `reader` for the record called `name` and return its parameters.
pub fn find_parameters<R: BufRead>(
    reader: R,
    source: impl Into<PathBuf>,
    name: &str,
) -> Result<Option<Vec<String>>, CatalogError> {
    for record in records(reader, source) {
        let record = record?;
        if record.name == name {
            return Ok(Some(record.parameters));
        }
    }
    Ok(None)
}

/// Scan `reader` for the first record whose parameters equal `params`, in order.
pub fn find_record_name<R: BufRead, S: AsRef<str>>(
    reader: R,
    source: impl Into<PathBuf>,
    params: &[S],
) -> Result<Option<String>, CatalogError> {
    for record in records(reader, source) {
        let record = record?;
        if record.parameters.len() == params.len()
            && record
                .parameters
                .iter()
                .zip(params)
                .all(|(a, b)| a == b.as_ref())
        {
            return Ok(Some(record.name));
        }
    }
    Ok(None)
}

/// Locates catalog resources by authority name.
///
/// Search paths are probed in order for a file named after the lowercased
/// authority; the embedded catalogs are the fallback when enabled.
#[derive(Debug, Clone)]
pub struct Catalog {
    search_paths: Vec<PathBuf>,
    embedded: bool,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog {
            search_paths: Vec::new(),
            embedded: true,
        }
    }
}

impl Catalog {
    pub fn new(search_paths: Vec<PathBuf>, embedded: bool) -> Self {
        Catalog {
            search_paths,
            embedded,
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Read the parameters of record `code` from the catalog of `authority`.
    pub fn read_parameters(
        &self,
        authority: &str,
        code: &str,
    ) -> Result<Option<Vec<String>>, CatalogError> {
        let params = self.with_resource(&authority.to_lowercase(), |reader, source| {
            find_parameters(reader, source, code)
        })?;
        debug!(authority, code, found = params.is_some(), "catalog lookup");
        Ok(params)
    }

    /// Find the EPSG code whose catalog record matches `params` exactly.
    pub fn read_epsg_code<S: AsRef<str>>(
        &self,
        params: &[S],
    ) -> Result<Option<String>, CatalogError> {
        let code = self.with_resource(EPSG, |reader, source| {
            find_record_name(reader, source, params)
        })?;
        debug!(found = ?code, "reverse catalog lookup");
        Ok(code)
    }

    fn with_resource<T>(
        &self,
        file: &str,
        scan: impl FnOnce(&mut dyn BufRead, &Path) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        if file.is_empty() || file.contains(['/', '\\']) || file.contains("..") {
            return Err(CatalogError::ResourceNotFound(file.to_string()));
        }
        for dir in &self.search_paths {
            let path = dir.join(file);
            match File::open(&path) {
                Ok(f) => {
                    debug!(path = %path.display(), "reading catalog");
                    return scan(&mut BufReader::new(f), &path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(CatalogError::Io { path, source }),
            }
        }
        if self.embedded {
            if let Some((_, text)) = EMBEDDED.iter().find(|(name, _)| *name == file) {
                let source = Path::new("nad").join(file);
                return scan(&mut text.as_bytes(), &source);
            }
        }
        Err(CatalogError::ResourceNotFound(file.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = "\
# a comment line
<1> +proj=longlat +ellps=WGS84 +no_defs <>
# second
<two> +proj=sinu +lon_0=10 # trailing comment
    +towgs84=1,2,3 +nadgrids=@null <>
<Two> proj=merc +units=us-ft <>
";

    fn lookup(text: &str, name: &str) -> Result<Option<Vec<String>>, CatalogError> {
        find_parameters(text.as_bytes(), "test", name)
    }

    #[test]
    fn test_find_parameters() {
        let params = lookup(CATALOG, "two").unwrap().unwrap();
        assert_eq!(
            params,
            vec!["+proj=sinu", "+lon_0=10", "+towgs84=1,2,3", "+nadgrids=@null"]
        );
    }

    #[test]
    fn test_adds_missing_plus_and_is_case_sensitive() {
        let params = lookup(CATALOG, "Two").unwrap().unwrap();
        assert_eq!(params, vec!["+proj=merc", "+units=us-ft"]);
        assert!(lookup(CATALOG, "TWO").unwrap().is_none());
    }

    #[test]
    fn test_flag_without_value() {
        let params = lookup(CATALOG, "1").unwrap().unwrap();
        assert_eq!(params.last().map(String::as_str), Some("+no_defs"));
    }

    #[test]
    fn test_missing_name_is_none() {
        assert!(lookup(CATALOG, "3").unwrap().is_none());
        assert!(lookup("", "3").unwrap().is_none());
    }

    #[test]
    fn test_missing_close_reports_line() {
        let text = "# header\n<1> +proj=longlat <>\n<2 +proj=sinu <>\n<3> +proj=merc <>\n";
        match lookup(text, "3") {
            Err(CatalogError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert_eq!(message, "'>' expected");
            }
            other => panic!("unexpected result {:?}", other),
        }
        // records before the broken one are still reachable
        assert!(lookup(text, "1").unwrap().is_some());
    }

    #[test]
    fn test_word_expected_after_open() {
        let err = lookup("\n\n< > +proj=sinu <>", "x").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 3, .. }));
        assert_eq!(err.to_string(), "3: Word expected after '<'");
    }

    #[test]
    fn test_missing_value_after_equals() {
        let err = lookup("<1> +proj= <>", "1").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 1, ref message } if message == "Value expected after '='"));
    }

    #[test]
    fn test_bad_terminator() {
        let err = lookup("<1> +proj=sinu < +x\n", "1").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { ref message, .. } if message == "'<>' expected"));
        let err = lookup("<1> +proj=sinu\n", "1").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_records_iterator() {
        let all: Vec<Record> = records(CATALOG.as_bytes(), "test")
            .collect::<Result<_, _>>()
            .unwrap();
        let names: Vec<&str> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["1", "two", "Two"]);
        assert_eq!(all[1].line, 4);
    }

    #[test]
    fn test_find_record_name_is_order_sensitive() {
        let params = ["+proj=merc", "+units=us-ft"];
        assert_eq!(
            find_record_name(CATALOG.as_bytes(), "test", &params).unwrap(),
            Some("Two".to_string())
        );
        let reversed = ["+units=us-ft", "+proj=merc"];
        assert_eq!(
            find_record_name(CATALOG.as_bytes(), "test", &reversed).unwrap(),
            None
        );
    }

    #[test]
    fn test_embedded_epsg() {
        let catalog = Catalog::default();
        let params = catalog.read_parameters("EPSG", "3005").unwrap().unwrap();
        assert_eq!(params[0], "+proj=aea");
        assert_eq!(
            catalog.read_epsg_code(&params).unwrap(),
            Some("3005".to_string())
        );
    }

    #[test]
    fn test_unknown_authority() {
        let catalog = Catalog::default();
        assert!(matches!(
            catalog.read_parameters("NOPE", "1"),
            Err(CatalogError::ResourceNotFound(_))
        ));
        assert!(matches!(
            catalog.read_parameters("../epsg", "1"),
            Err(CatalogError::ResourceNotFound(_))
        ));
        let without_embedded = Catalog::new(Vec::new(), false);
        assert!(matches!(
            without_embedded.read_parameters("EPSG", "3005"),
            Err(CatalogError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn test_search_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("epsg")).unwrap();
        writeln!(file, "<3005> +proj=sinu +ellps=sphere <>").unwrap();
        let catalog = Catalog::new(vec![dir.path().to_path_buf()], true);
        let params = catalog.read_parameters("EPSG", "3005").unwrap().unwrap();
        assert_eq!(params, vec!["+proj=sinu", "+ellps=sphere"]);
        // not in the file, and the embedded catalog is not consulted
        assert!(catalog.read_parameters("epsg", "4326").unwrap().is_none());
        // other authorities still fall back to the embedded catalogs
        assert!(catalog.read_parameters("ESRI", "54008").unwrap().is_some());
    }
}
