use crate::error::ParseError;
use crate::model::{DesktopEntry, EntryKind};
use log::debug;
use std::io::BufRead;

const HEADER: &str = "[desktop entry]";
const TYPE_KEY: &str = "type=";
const NAME_KEY: &str = "name=";
const PATH_KEY: &str = "path=";
const EXEC_KEY: &str = "exec=";

/// Field codes replaced by the launch arguments.
const FIELD_CODES: [&str; 4] = ["%F", "%f", "%U", "%u"];

/// Escapes undone in Exec values, longest first. Applied in a single
/// left-to-right pass so replacement output is never matched again.
const EXEC_ESCAPES: &[(&str, &str)] = &[
    (r"\\\\", r"\\"),
    (r"\\\", r"\\"),
    (r"\\ ", r"\ "),
    (r"\\`", r"\`"),
    (r"\\$", r"\$"),
    (r"\\(", r"\("),
    (r"\\)", r"\)"),
    ("%%", "%"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    BeforeHeader,
    DesktopEntry,
}

/// Parses the `[Desktop Entry]` section of a desktop file.
///
/// Scanning stops at the next section header. Keys other than `Type`,
/// `Name`, `Path` and `Exec` are ignored.
pub fn parse<R: BufRead>(mut content: R) -> Result<DesktopEntry, ParseError> {
    let mut entry = DesktopEntry::default();
    let mut section = Section::BeforeHeader;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if content.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match section {
            Section::BeforeHeader => {
                if line.eq_ignore_ascii_case(HEADER) {
                    section = Section::DesktopEntry;
                    continue;
                }
                return Err(ParseError::MissingHeader);
            }
            Section::DesktopEntry if line.starts_with('[') => break,
            Section::DesktopEntry => {}
        }

        if let Some(value) = strip_key(line, TYPE_KEY) {
            match EntryKind::from_value(value) {
                Some(kind) => entry.kind = kind,
                None => debug!("Ignoring unrecognized Type={}", value),
            }
        } else if let Some(value) = strip_key(line, NAME_KEY) {
            entry.name = value.to_string();
        } else if let Some(value) = strip_key(line, PATH_KEY) {
            entry.working_dir = value.to_string();
        } else if let Some(value) = strip_key(line, EXEC_KEY) {
            entry.exec = shlex::split(&unquote_exec(value))
                .ok_or_else(|| ParseError::Tokenize(value.to_string()))?;
        }
    }

    if section == Section::BeforeHeader {
        return Err(ParseError::MissingHeader);
    }

    Ok(entry)
}

/// Undoes the double escaping desktop files apply to shell metacharacters.
pub fn unquote_exec(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    'scan: while let Some(c) = rest.chars().next() {
        for (escaped, plain) in EXEC_ESCAPES {
            if let Some(tail) = rest.strip_prefix(escaped) {
                out.push_str(plain);
                rest = tail;
                continue 'scan;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

fn strip_key<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let head = line.get(..key.len())?;
    if head.eq_ignore_ascii_case(key) {
        Some(&line[key.len()..])
    } else {
        None
    }
}

impl DesktopEntry {
    /// Fills the field codes in `exec` with `args` joined by spaces.
    ///
    /// The template is rewritten in place, so a second call has nothing
    /// left to substitute.
    pub fn expand_exec<S: AsRef<str>>(&mut self, args: &[S]) -> &[String] {
        let joined = args.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");

        for token in self.exec.iter_mut() {
            if FIELD_CODES.contains(&token.as_str()) {
                *token = joined.clone();
            }
        }

        &self.exec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufReader, Read};

    const BROWSER: &str = "[Desktop Entry]\n\
        Type=Application\n\
        Name=Example Browser\n\
        Exec=/usr/bin/browser --url %U\n";

    #[test]
    fn parses_and_expands_browser_entry() {
        let mut entry = parse(BROWSER.as_bytes()).unwrap();
        assert_eq!(entry.kind, EntryKind::Application);
        assert_eq!(entry.name, "Example Browser");

        let cmd = entry.expand_exec(&["https://example.com"]);
        assert_eq!(cmd, ["/usr/bin/browser", "--url", "https://example.com"]);
    }

    #[test]
    fn entry_without_exec_has_empty_command() {
        let entry = parse("[Desktop Entry]\nName=Nothing\nType=Link\n".as_bytes()).unwrap();
        assert!(entry.exec.is_empty());
        assert_eq!(entry.kind, EntryKind::Link);
    }

    #[test]
    fn missing_header_fails() {
        let err = parse("Name=Foo\nExec=foo\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader));

        let err = parse("# only a comment\n\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader));
    }

    #[test]
    fn other_first_section_fails() {
        let err = parse("[Desktop Action new]\nExec=foo\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingHeader));
    }

    #[test]
    fn second_section_stops_scanning() {
        let text = "[Desktop Entry]\n\
            Name=Main\n\
            Exec=main %u\n\
            [Desktop Action private]\n\
            Name=Private\n\
            Exec=main --private %u\n";
        let entry = parse(text.as_bytes()).unwrap();
        assert_eq!(entry.name, "Main");
        assert_eq!(entry.exec, ["main", "%u"]);
    }

    #[test]
    fn keys_and_header_ignore_case_and_whitespace() {
        let text = "  # leading comment\n  [DESKTOP ENTRY]  \r\n\
            TYPE=directory\r\n\
            name=Files\n\
            PATH=/tmp/work\n\
            eXeC=files %F\n";
        let entry = parse(text.as_bytes()).unwrap();
        assert_eq!(entry.kind, EntryKind::Directory);
        assert_eq!(entry.name, "Files");
        assert_eq!(entry.working_dir, "/tmp/work");
        assert_eq!(entry.exec, ["files", "%F"]);
    }

    #[test]
    fn last_key_wins_and_unknown_lines_ignored() {
        let text = "[Desktop Entry]\n\
            Name=First\n\
            Name[de]=Erste\n\
            Icon=browser\n\
            Type=Service\n\
            Name=Second\n";
        let entry = parse(text.as_bytes()).unwrap();
        assert_eq!(entry.name, "Second");
        assert_eq!(entry.kind, EntryKind::Unknown);
    }

    #[test]
    fn unbalanced_quotes_fail_tokenizing() {
        let err = parse("[Desktop Entry]\nExec=browser \"--url %u\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Tokenize(_)));
    }

    #[test]
    fn exec_honours_shell_quoting() {
        let text = "[Desktop Entry]\nExec=\"/opt/My App/run\" --name 'a b' two\\ words %U\n";
        let entry = parse(text.as_bytes()).unwrap();
        assert_eq!(entry.exec, ["/opt/My App/run", "--name", "a b", "two words", "%U"]);
    }

    #[test]
    fn stray_bytes_are_decoded_lossily() {
        let text = b"[Desktop Entry]\nName=Caf\xff\nExec=cafe %u\n";
        let entry = parse(&text[..]).unwrap();
        assert_eq!(entry.name, "Caf\u{FFFD}");
        assert_eq!(entry.exec, ["cafe", "%u"]);
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn read_failure_is_io_error() {
        let err = parse(BufReader::new(BrokenReader)).unwrap_err();
        assert!(matches!(err, ParseError::Io(ref e) if e.to_string() == "disk on fire"));
    }

    #[test]
    fn directory_as_descriptor_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = std::fs::File::open(dir.path()).unwrap();
        assert!(matches!(parse(BufReader::new(file)), Err(ParseError::Io(_))));
    }

    #[test]
    fn unquote_replaces_escapes_once() {
        assert_eq!(unquote_exec("100%%"), "100%");
        assert_eq!(unquote_exec(r"a\\ b"), r"a\ b");
        assert_eq!(unquote_exec(r"\\$HOME \\`x\\`"), r"\$HOME \`x\`");
        assert_eq!(unquote_exec(r"\\(\\)"), r"\(\)");
        assert_eq!(unquote_exec(r"\\\\"), r"\\");
        assert_eq!(unquote_exec(r"\\\"), r"\\");
        // output of one replacement is not fed to another
        assert_eq!(unquote_exec("%%%%"), "%%");
    }

    #[test]
    fn unquote_leaves_plain_text_alone() {
        for raw in ["", "firefox %u", "sh -c 'echo $1'", r"a\b", "50% off"] {
            assert_eq!(unquote_exec(raw), raw);
        }
    }

    #[test]
    fn expand_only_replaces_standalone_field_codes() {
        let mut entry = DesktopEntry {
            exec: ["app", "%f", "--file=%f", "%F", "%U", "%u", "%i", "x%u"]
                .map(String::from)
                .to_vec(),
            ..Default::default()
        };
        let cmd = entry.expand_exec(&["a", "b"]).to_vec();
        assert_eq!(cmd, ["app", "a b", "--file=%f", "a b", "a b", "a b", "%i", "x%u"]);

        // nothing left to fill on a second pass
        assert_eq!(entry.expand_exec(&["c"]), cmd.as_slice());
    }
}
