//! INI engine: `[section]` + `key=value`, комментарии `;` и `#`.
//!
//! Семантика flush (merge):
//! - перечитать файл с диска (его могли обновить другие хэндлы на тот же shadow);
//! - наложить поверх свои pending set/remove;
//! - переписать файл целиком (секции и ключи в отсортированном порядке).
//!
//! Отсутствующий файл читается как пустой. Битая строка -> FormatError,
//! такой файл flush не перезаписывает.
//!
//! Имена, которые парсер прочитал бы иначе (перевод строки, `=` в ключе,
//! ключ с `[`/`;`/`#` в начале, `]` в секции, пробелы по краям), не пишутся:
//! set() отклоняет такой ключ, и flush отвечает FormatError, пока ключ не
//! отозван через remove(). Перед записью отрендеренный текст разбирается
//! обратно и сверяется с данными.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use log::debug;

use super::{join_key, split_key, KvEngine, KvHandle, KvStatus};
use crate::consts::GENERAL_SECTION;

type Sections = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct IniEngine;

impl IniEngine {
    pub fn new() -> Self {
        IniEngine
    }
}

impl KvEngine for IniEngine {
    fn open(&self, path: &Path) -> io::Result<Box<dyn KvHandle>> {
        Ok(Box::new(IniHandle::open(path)))
    }

    fn name(&self) -> &'static str {
        "ini"
    }
}

#[derive(Debug)]
pub struct IniHandle {
    path: PathBuf,
    data: Sections,
    // (section, key) -> Some(value) | None (removal)
    pending: BTreeMap<(String, String), Option<String>>,
    // keys refused by set(); block flush until removed
    rejected: BTreeSet<String>,
    status: KvStatus,
}

impl IniHandle {
    pub fn open(path: &Path) -> Self {
        let (data, status) = match read_sections(path) {
            Ok(d) => (d, KvStatus::NoError),
            Err(st) => (Sections::new(), st),
        };
        Self {
            path: path.to_path_buf(),
            data,
            pending: BTreeMap::new(),
            rejected: BTreeSet::new(),
            status,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Keys refused by `set` that still block `flush`.
    pub fn rejected_keys(&self) -> Vec<String> {
        self.rejected.iter().cloned().collect()
    }
}

/// True if `key` survives a write and re-read unchanged.
pub fn is_storable_key(key: &str) -> bool {
    let (section, name) = split_key(key);
    valid_section(section) && valid_name(name)
}

fn valid_section(section: &str) -> bool {
    !section.is_empty()
        && section.trim() == section
        && !section.contains(['\n', '\r', '[', ']'])
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.contains(['\n', '\r', '='])
        && !name.starts_with(['[', ';', '#'])
}

impl KvHandle for IniHandle {
    fn get(&self, key: &str) -> Option<String> {
        let (section, name) = split_key(key);
        if let Some(p) = self.pending.get(&(section.to_string(), name.to_string())) {
            return p.clone();
        }
        self.data.get(section).and_then(|s| s.get(name)).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        if !is_storable_key(key) {
            debug!("ini: rejected key {:?} for {}", key, self.path.display());
            self.rejected.insert(key.to_string());
            self.status = KvStatus::FormatError;
            return;
        }
        let (section, name) = split_key(key);
        self.pending
            .insert((section.to_string(), name.to_string()), Some(value.trim().to_string()));
    }

    fn remove(&mut self, key: &str) {
        if self.rejected.remove(key) || !is_storable_key(key) {
            // never written, nothing to remove on disk
            return;
        }
        let (section, name) = split_key(key);
        self.pending.insert((section.to_string(), name.to_string()), None);
    }

    fn keys(&self) -> Vec<String> {
        let mut view = self.data.clone();
        apply_pending(&mut view, &self.pending);
        let mut out = Vec::new();
        for (section, entries) in &view {
            for name in entries.keys() {
                out.push(join_key(section, name));
            }
        }
        out.sort();
        out
    }

    fn flush(&mut self) -> KvStatus {
        if !self.rejected.is_empty() {
            debug!(
                "ini: {} rejected key(s) pending, not writing {}",
                self.rejected.len(),
                self.path.display()
            );
            self.status = KvStatus::FormatError;
            return self.status;
        }

        let mut fresh = match read_sections(&self.path) {
            Ok(d) => d,
            Err(st) => {
                self.status = st;
                return st;
            }
        };

        if !self.pending.is_empty() {
            apply_pending(&mut fresh, &self.pending);
            let text = render_sections(&fresh);
            match parse_sections(&text) {
                Ok(back) if back == fresh => {}
                _ => {
                    debug!("ini: rendered text for {} does not read back", self.path.display());
                    self.status = KvStatus::FormatError;
                    return self.status;
                }
            }
            if let Err(e) = fs::write(&self.path, text) {
                debug!("ini: write {} failed: {}", self.path.display(), e);
                self.status = KvStatus::AccessError;
                return self.status;
            }
            debug!(
                "ini: flushed {} pending change(s) to {}",
                self.pending.len(),
                self.path.display()
            );
            self.pending.clear();
        }

        self.data = fresh;
        self.status = KvStatus::NoError;
        self.status
    }

    fn status(&self) -> KvStatus {
        self.status
    }
}

fn apply_pending(data: &mut Sections, pending: &BTreeMap<(String, String), Option<String>>) {
    for ((section, name), value) in pending {
        match value {
            Some(v) => {
                data.entry(section.clone())
                    .or_default()
                    .insert(name.clone(), v.clone());
            }
            None => {
                if let Some(s) = data.get_mut(section) {
                    s.remove(name);
                    if s.is_empty() {
                        data.remove(section);
                    }
                }
            }
        }
    }
}

fn read_sections(path: &Path) -> Result<Sections, KvStatus> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Sections::new()),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            debug!("ini: {} is not valid UTF-8", path.display());
            return Err(KvStatus::FormatError);
        }
        Err(e) => {
            debug!("ini: read {} failed: {}", path.display(), e);
            return Err(KvStatus::AccessError);
        }
    };
    parse_sections(&text).map_err(|line_no| {
        debug!("ini: malformed line {} in {}", line_no, path.display());
        KvStatus::FormatError
    })
}

/// Parse INI text. Err carries the 1-based number of the first bad line.
fn parse_sections(text: &str) -> Result<Sections, usize> {
    let mut out = Sections::new();
    let mut current = GENERAL_SECTION.to_string();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('[') {
            let name = rest.strip_suffix(']').ok_or(i + 1)?.trim();
            if name.is_empty() {
                return Err(i + 1);
            }
            current = name.to_string();
            continue;
        }
        let (k, v) = line.split_once('=').ok_or(i + 1)?;
        let k = k.trim();
        if k.is_empty() {
            return Err(i + 1);
        }
        out.entry(current.clone())
            .or_default()
            .insert(k.to_string(), unescape(v.trim()));
    }
    Ok(out)
}

fn render_sections(data: &Sections) -> String {
    let mut out = String::new();
    // General first, the rest in sorted order
    let mut ordered: Vec<(&str, &BTreeMap<String, String>)> = Vec::with_capacity(data.len());
    if let Some(g) = data.get(GENERAL_SECTION) {
        ordered.push((GENERAL_SECTION, g));
    }
    for (name, entries) in data {
        if name != GENERAL_SECTION {
            ordered.push((name.as_str(), entries));
        }
    }

    for (section, entries) in ordered {
        if entries.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push('[');
        out.push_str(section);
        out.push_str("]\n");
        for (k, v) in entries {
            out.push_str(k);
            out.push('=');
            out.push_str(&escape(v));
            out.push('\n');
        }
    }
    out
}

fn escape(v: &str) -> String {
    let mut s = String::with_capacity(v.len());
    for c in v.chars() {
        match c {
            '\\' => s.push_str("\\\\"),
            '\n' => s.push_str("\\n"),
            '\r' => s.push_str("\\r"),
            _ => s.push(c),
        }
    }
    s
}

fn unescape(v: &str) -> String {
    let mut s = String::with_capacity(v.len());
    let mut chars = v.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            s.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => s.push('\n'),
            Some('r') => s.push('\r'),
            Some('\\') => s.push('\\'),
            Some(other) => {
                s.push('\\');
                s.push(other);
            }
            None => s.push('\\'),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn tmp_file(tag: &str) -> PathBuf {
        let t = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!("inivault-ini-{tag}-{}-{t}.ini", std::process::id()))
    }

    #[test]
    fn parse_sections_and_general() {
        let text = "top=1\n; comment\n[meta]\nfile_version = 3\n\n# another\n[board]\nname=  main  \n";
        let s = parse_sections(text).unwrap();
        assert_eq!(s[GENERAL_SECTION]["top"], "1");
        assert_eq!(s["meta"]["file_version"], "3");
        assert_eq!(s["board"]["name"], "main");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_sections("[meta]\nthis is not ini\n"), Err(2));
        assert_eq!(parse_sections("[]\n"), Err(1));
        assert_eq!(parse_sections("[open\n"), Err(1));
        assert_eq!(parse_sections("=novalue\n"), Err(1));
    }

    #[test]
    fn escape_roundtrip_multiline_value() {
        let v = "line1\nline2\\tail";
        assert_eq!(unescape(&escape(v)), v);
    }

    #[test]
    fn missing_file_reads_empty() {
        let p = tmp_file("missing");
        let h = IniHandle::open(&p);
        assert_eq!(h.status(), KvStatus::NoError);
        assert!(h.keys().is_empty());
    }

    #[test]
    fn malformed_file_reports_format_error() {
        let p = tmp_file("bad");
        fs::write(&p, "[meta]\ngarbage\n").unwrap();
        let mut h = IniHandle::open(&p);
        assert_eq!(h.status(), KvStatus::FormatError);

        // flush must not overwrite a malformed file
        h.set("meta.x", "1");
        assert_eq!(h.flush(), KvStatus::FormatError);
        assert_eq!(fs::read_to_string(&p).unwrap(), "[meta]\ngarbage\n");
        let _ = fs::remove_file(&p);
    }

    #[test]
    fn pending_visible_before_flush_and_persisted_after() {
        let p = tmp_file("pending");
        let mut h = IniHandle::open(&p);
        h.set("meta.file_version", "7");
        h.set("plain", "x");
        assert_eq!(h.get("meta.file_version").as_deref(), Some("7"));
        assert!(h.has_pending());
        assert!(!p.exists());

        assert_eq!(h.flush(), KvStatus::NoError);
        assert!(!h.has_pending());
        let text = fs::read_to_string(&p).unwrap();
        assert_eq!(text, "[General]\nplain=x\n\n[meta]\nfile_version=7\n");

        h.remove("plain");
        assert_eq!(h.get("plain"), None);
        assert_eq!(h.flush(), KvStatus::NoError);
        assert_eq!(h.keys(), vec!["meta.file_version".to_string()]);
        let _ = fs::remove_file(&p);
    }

    #[test]
    fn unsafe_keys_are_refused_and_block_flush() {
        let p = tmp_file("unsafe");
        let mut h = IniHandle::open(&p);
        h.set("board.ok", "1");
        for bad in ["board.bad\nline", "board.#tag", "board.;c", "board.a=b", "board.[x", "se]c.k", " pad.k", "board. k"] {
            h.set(bad, "v");
            assert_eq!(h.status(), KvStatus::FormatError, "{bad:?}");
            assert_eq!(h.get(bad), None);
        }
        assert_eq!(h.keys(), vec!["board.ok".to_string()]);

        assert_eq!(h.flush(), KvStatus::FormatError);
        assert!(!p.exists());
        assert!(h.has_pending());

        for bad in h.rejected_keys() {
            h.remove(&bad);
        }
        assert_eq!(h.flush(), KvStatus::NoError);
        let back = IniHandle::open(&p);
        assert_eq!(back.status(), KvStatus::NoError);
        assert_eq!(back.keys(), vec!["board.ok".to_string()]);
        let _ = fs::remove_file(&p);
    }

    #[test]
    fn tricky_but_valid_entries_survive_reload() {
        let p = tmp_file("tricky");
        let mut h = IniHandle::open(&p);
        h.set("board.a.b", "dotted");
        h.set("board.eq", "x=y=z");
        h.set("board.hash", "#not a comment");
        h.set("board.semi", ";also not");
        h.set("net.multi", "one\ntwo\\three");
        h.set("top", "[not a section]");
        assert_eq!(h.flush(), KvStatus::NoError);

        let back = IniHandle::open(&p);
        assert_eq!(back.status(), KvStatus::NoError);
        assert_eq!(back.get("board.a.b").as_deref(), Some("dotted"));
        assert_eq!(back.get("board.eq").as_deref(), Some("x=y=z"));
        assert_eq!(back.get("board.hash").as_deref(), Some("#not a comment"));
        assert_eq!(back.get("board.semi").as_deref(), Some(";also not"));
        assert_eq!(back.get("net.multi").as_deref(), Some("one\ntwo\\three"));
        assert_eq!(back.get("top").as_deref(), Some("[not a section]"));
        assert_eq!(back.keys(), h.keys());
        let _ = fs::remove_file(&p);
    }

    #[test]
    fn two_handles_merge_on_flush() {
        let p = tmp_file("merge");
        let mut a = IniHandle::open(&p);
        let mut b = IniHandle::open(&p);
        a.set("alpha.k", "1");
        b.set("beta.k", "2");
        assert_eq!(a.flush(), KvStatus::NoError);
        assert_eq!(b.flush(), KvStatus::NoError);

        // b re-read the file during flush, so it sees a's change too
        assert_eq!(b.get("alpha.k").as_deref(), Some("1"));
        let fresh = IniHandle::open(&p);
        assert_eq!(fresh.keys(), vec!["alpha.k".to_string(), "beta.k".to_string()]);
        let _ = fs::remove_file(&p);
    }
}
