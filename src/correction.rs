//! Symbol correction: heuristics for symbols missing from the table, an operator prompt, and a
//! durable log so that every attempted symbol is resolved at most once.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::{LazyLock, PoisonError, RwLock},
};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionPolicy {
    #[default]
    Automatic,
    Interactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionSettings {
    pub enabled: bool,
    pub policy: CorrectionPolicy,
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: CorrectionPolicy::Automatic,
        }
    }
}

static CORRECTION_SETTINGS: LazyLock<RwLock<CorrectionSettings>> =
    LazyLock::new(|| RwLock::new(CorrectionSettings::default()));

/// Process-wide correction settings, used by dictionaries without pinned settings.
pub fn correction_settings() -> CorrectionSettings {
    *CORRECTION_SETTINGS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Replaces the process-wide settings, returning the previous ones.
pub fn set_correction_settings(settings: CorrectionSettings) -> CorrectionSettings {
    let mut guard = CORRECTION_SETTINGS
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *guard, settings)
}

fn update_correction_settings(
    update: impl FnOnce(&mut CorrectionSettings),
) -> CorrectionSettings {
    let mut guard = CORRECTION_SETTINGS
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let previous = *guard;
    update(&mut guard);
    previous
}

pub fn set_correction_enabled(enabled: bool) -> CorrectionSettings {
    update_correction_settings(|settings| settings.enabled = enabled)
}

pub fn set_correction_policy(policy: CorrectionPolicy) -> CorrectionSettings {
    update_correction_settings(|settings| settings.policy = policy)
}

/// Operator side of the interactive policy.
pub trait CorrectionPrompt: Send {
    /// Offered the automatic suggestion for `attempted`; `true` accepts it.
    fn accept_suggestion(&mut self, attempted: &str, suggestion: &str) -> bool;

    /// Asks for a replacement. `None` or an empty answer leaves `attempted` unresolved.
    fn request_replacement(&mut self, attempted: &str) -> Option<String>;

    /// Told that `replacement` is not a known symbol either; another request follows.
    fn rejected(&mut self, _attempted: &str, _replacement: &str) {}
}

/// Accepts every suggestion and never supplies a replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessPrompt;

impl CorrectionPrompt for HeadlessPrompt {
    fn accept_suggestion(&mut self, _attempted: &str, _suggestion: &str) -> bool {
        true
    }

    fn request_replacement(&mut self, _attempted: &str) -> Option<String> {
        None
    }
}

/// Asks on the terminal through rustyline. End of input or a read error counts as an empty answer.
#[cfg(feature = "terminal-prompt")]
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    read_line: fn(&str) -> Option<String>,
}

#[cfg(feature = "terminal-prompt")]
impl Default for TerminalPrompt {
    fn default() -> Self {
        Self {
            read_line: readline,
        }
    }
}

#[cfg(feature = "terminal-prompt")]
fn readline(prompt: &str) -> Option<String> {
    let mut editor = rustyline::DefaultEditor::new().ok()?;
    editor.readline(prompt).ok()
}

/// `[Yn]`: anything but `n` accepts, including an empty answer.
#[cfg(feature = "terminal-prompt")]
fn accepts_suggestion(answer: Option<&str>) -> bool {
    !answer.unwrap_or_default().trim().eq_ignore_ascii_case("n")
}

#[cfg(feature = "terminal-prompt")]
impl CorrectionPrompt for TerminalPrompt {
    fn accept_suggestion(&mut self, attempted: &str, suggestion: &str) -> bool {
        let answer = (self.read_line)(&format!(
            "\"{attempted}\" unrecognized. Use \"{suggestion}\" instead? [Yn] "
        ));
        accepts_suggestion(answer.as_deref())
    }

    fn request_replacement(&mut self, attempted: &str) -> Option<String> {
        (self.read_line)(&format!(
            "Please correct \"{attempted}\" or press enter to leave it unresolved: "
        ))
    }

    fn rejected(&mut self, _attempted: &str, replacement: &str) {
        eprintln!("Failed to recognize \"{replacement}\"");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionEntry {
    pub attempted: String,
    /// Empty when the symbol is permanently unresolved.
    pub resolved: String,
}

/// Append-only `attempted<TAB>resolved` file, created on the first append.
#[derive(Debug)]
pub struct CorrectionLog {
    path: PathBuf,
    file: Option<File>,
}

impl CorrectionLog {
    /// Returns the log at `path` with the entries already in it. Nothing is created on disk.
    pub fn open(path: &Path) -> Result<(Self, Vec<CorrectionEntry>)> {
        let entries = if path.exists() {
            parse_log(&fs::read_to_string(path)?)
        } else {
            vec![]
        };
        Ok((
            Self {
                path: path.to_path_buf(),
                file: None,
            },
            entries,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&mut self) -> Result<&mut File> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?
            }
        };
        Ok(self.file.insert(file))
    }

    /// Writes one whole line and flushes it.
    pub fn append(&mut self, entry: &CorrectionEntry) -> Result<()> {
        let line = format!("{}\t{}\n", entry.attempted, entry.resolved);
        let file = self.file()?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

fn parse_log(text: &str) -> Vec<CorrectionEntry> {
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (attempted, resolved) = line.split_once('\t').unwrap_or((line, ""));
            if attempted.is_empty() {
                return None;
            }
            Some(CorrectionEntry {
                attempted: attempted.to_string(),
                resolved: resolved.to_string(),
            })
        })
        .collect()
}

fn is_loggable(value: &str) -> bool {
    !value.contains(['\t', '\n', '\r'])
}

/// Case and punctuation normalisation, cheapest first. The first candidate in `symbols` wins.
pub fn automatic_candidate(attempted: &str, symbols: &HashMap<String, String>) -> Option<String> {
    let upper = attempted.to_uppercase();
    let without_hyphens = attempted.replace('-', "");
    let upper_without_hyphens = upper.replace('-', "");
    [upper, without_hyphens, upper_without_hyphens]
        .into_iter()
        .find(|candidate| symbols.contains_key(candidate))
}

pub struct CorrectionResolver {
    cache: HashMap<String, String>,
    log: Option<CorrectionLog>,
    prompt: Box<dyn CorrectionPrompt>,
}

impl std::fmt::Debug for CorrectionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("CorrectionResolver")
            .field("corrections", &self.cache.len())
            .field("log", &self.log.as_ref().map(CorrectionLog::path))
            .finish()
    }
}

impl CorrectionResolver {
    /// A resolver whose corrections live only as long as the process.
    pub fn in_memory(prompt: Box<dyn CorrectionPrompt>) -> Self {
        Self {
            cache: HashMap::new(),
            log: None,
            prompt,
        }
    }

    /// A resolver backed by the log at `path`; earlier decisions are reloaded from it.
    pub fn with_log(path: &Path, prompt: Box<dyn CorrectionPrompt>) -> Result<Self> {
        let (log, entries) = CorrectionLog::open(path)?;
        info!(
            path = %path.display(),
            corrections = entries.len(),
            "Correction log loaded"
        );
        let cache = entries
            .into_iter()
            .map(|entry| (entry.attempted, entry.resolved))
            .collect();
        Ok(Self {
            cache,
            log: Some(log),
            prompt,
        })
    }

    pub fn cached(&self, attempted: &str) -> Option<&str> {
        self.cache.get(attempted).map(String::as_str)
    }

    pub fn entries(&self) -> Vec<CorrectionEntry> {
        let mut out: Vec<CorrectionEntry> = self
            .cache
            .iter()
            .map(|(attempted, resolved)| CorrectionEntry {
                attempted: attempted.clone(),
                resolved: resolved.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.attempted.cmp(&b.attempted));
        out
    }

    /// Side-effect free automatic suggestion.
    pub fn preview(&self, attempted: &str, symbols: &HashMap<String, String>) -> Option<String> {
        automatic_candidate(attempted, symbols)
    }

    /// Resolves a symbol missing from `symbols` to one present there, or to `""`. A cached
    /// decision, including a cached `""`, is returned without consulting `policy`.
    pub fn resolve(
        &mut self,
        attempted: &str,
        symbols: &HashMap<String, String>,
        policy: CorrectionPolicy,
    ) -> String {
        if attempted.is_empty() {
            return String::new();
        }
        if let Some(resolved) = self.cache.get(attempted) {
            return resolved.clone();
        }
        let resolved = match policy {
            CorrectionPolicy::Automatic => {
                automatic_candidate(attempted, symbols).unwrap_or_default()
            }
            CorrectionPolicy::Interactive => self.resolve_interactively(attempted, symbols),
        };
        if resolved.is_empty() {
            warn!(symbol = attempted, "Unrecognized symbol left unresolved");
        } else {
            warn!("Unrecognized symbol \"{attempted}\", \"{resolved}\" used instead");
        }
        self.record(attempted, &resolved);
        resolved
    }

    fn resolve_interactively(
        &mut self,
        attempted: &str,
        symbols: &HashMap<String, String>,
    ) -> String {
        if let Some(suggestion) = self.preview(attempted, symbols) {
            if self.prompt.accept_suggestion(attempted, &suggestion) {
                return suggestion;
            }
        }
        loop {
            let answer = self
                .prompt
                .request_replacement(attempted)
                .map(|answer| answer.trim().to_string())
                .unwrap_or_default();
            if answer.is_empty() || symbols.contains_key(&answer) {
                return answer;
            }
            self.prompt.rejected(attempted, &answer);
        }
    }

    fn record(&mut self, attempted: &str, resolved: &str) {
        self.cache
            .insert(attempted.to_string(), resolved.to_string());
        let Some(log) = self.log.as_mut() else {
            return;
        };
        if !is_loggable(attempted) || !is_loggable(resolved) {
            warn!(
                symbol = %attempted.escape_debug(),
                "Correction kept in memory only; it cannot be written as one log line"
            );
            return;
        }
        let entry = CorrectionEntry {
            attempted: attempted.to_string(),
            resolved: resolved.to_string(),
        };
        if let Err(e) = log.append(&entry) {
            error!(path = %log.path().display(), "Could not append correction log: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    };
    use tempfile::tempdir;

    fn symbols() -> HashMap<String, String> {
        [("ASIC1", "P1"), ("HLA-A", "P2"), ("RGS4", "P3")]
            .into_iter()
            .map(|(s, p)| (s.to_string(), p.to_string()))
            .collect()
    }

    #[derive(Default)]
    struct ScriptedPrompt {
        accept: bool,
        answers: VecDeque<String>,
        asked: Arc<AtomicUsize>,
        rejected: Vec<String>,
    }

    impl CorrectionPrompt for ScriptedPrompt {
        fn accept_suggestion(&mut self, _attempted: &str, _suggestion: &str) -> bool {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.accept
        }

        fn request_replacement(&mut self, _attempted: &str) -> Option<String> {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.answers.pop_front()
        }

        fn rejected(&mut self, _attempted: &str, replacement: &str) {
            self.rejected.push(replacement.to_string());
        }
    }

    fn log_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_automatic_rules_in_order() {
        let symbols = symbols();
        assert_eq!(automatic_candidate("asic1", &symbols).as_deref(), Some("ASIC1"));
        assert_eq!(automatic_candidate("ASIC-1", &symbols).as_deref(), Some("ASIC1"));
        assert_eq!(automatic_candidate("Asic-1", &symbols).as_deref(), Some("ASIC1"));
        // upper-casing is tried before hyphen removal
        assert_eq!(automatic_candidate("hla-a", &symbols).as_deref(), Some("HLA-A"));
        assert_eq!(automatic_candidate("NOPE", &symbols), None);
    }

    #[test]
    fn test_automatic_resolution_is_logged_once() {
        let td = tempdir().unwrap();
        let path = td.path().join("nested").join("rescue_history.txt");
        let mut resolver =
            CorrectionResolver::with_log(&path, Box::new(HeadlessPrompt)).unwrap();
        let symbols = symbols();

        assert_eq!(resolver.resolve("asic1", &symbols, CorrectionPolicy::Automatic), "ASIC1");
        assert_eq!(resolver.resolve("asic1", &symbols, CorrectionPolicy::Automatic), "ASIC1");
        assert_eq!(resolver.resolve("NOPE", &symbols, CorrectionPolicy::Automatic), "");
        assert_eq!(resolver.resolve("NOPE", &symbols, CorrectionPolicy::Automatic), "");
        assert_eq!(log_lines(&path), vec!["asic1\tASIC1", "NOPE\t"]);
    }

    #[test]
    fn test_log_is_reloaded_and_unresolved_is_terminal() {
        let td = tempdir().unwrap();
        let path = td.path().join("rescue_history.txt");
        fs::write(&path, "rgs-4\t\nFOO\tRGS4\r\n\nBAR\n").unwrap();

        let asked = Arc::new(AtomicUsize::new(0));
        let prompt = ScriptedPrompt {
            accept: true,
            asked: asked.clone(),
            ..Default::default()
        };
        let mut resolver = CorrectionResolver::with_log(&path, Box::new(prompt)).unwrap();
        assert_eq!(resolver.cached("FOO"), Some("RGS4"));
        assert_eq!(resolver.cached("BAR"), Some(""));

        // would resolve to RGS4 automatically, but the logged decision stands
        let symbols = symbols();
        assert_eq!(resolver.resolve("rgs-4", &symbols, CorrectionPolicy::Interactive), "");
        assert_eq!(resolver.resolve("FOO", &symbols, CorrectionPolicy::Automatic), "RGS4");
        assert_eq!(asked.load(Ordering::SeqCst), 0);
        assert_eq!(log_lines(&path).len(), 4);
    }

    #[test]
    fn test_interactive_accepts_suggestion() {
        let asked = Arc::new(AtomicUsize::new(0));
        let prompt = ScriptedPrompt {
            accept: true,
            asked: asked.clone(),
            ..Default::default()
        };
        let mut resolver = CorrectionResolver::in_memory(Box::new(prompt));
        let symbols = symbols();
        assert_eq!(
            resolver.resolve("Asic-1", &symbols, CorrectionPolicy::Interactive),
            "ASIC1"
        );
        assert_eq!(
            resolver.resolve("Asic-1", &symbols, CorrectionPolicy::Interactive),
            "ASIC1"
        );
        assert_eq!(asked.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_interactive_manual_replacement_until_known() {
        let td = tempdir().unwrap();
        let path = td.path().join("rescue_history.txt");
        let prompt = ScriptedPrompt {
            accept: false,
            answers: ["WRONG", " RGS4 "].into_iter().map(String::from).collect(),
            ..Default::default()
        };
        let mut resolver = CorrectionResolver::with_log(&path, Box::new(prompt)).unwrap();
        assert_eq!(
            resolver.resolve("asic1", &symbols(), CorrectionPolicy::Interactive),
            "RGS4"
        );
        assert_eq!(log_lines(&path), vec!["asic1\tRGS4"]);
        assert_eq!(resolver.entries().len(), 1);
    }

    #[test]
    fn test_interactive_abandon() {
        let prompt = ScriptedPrompt {
            accept: false,
            answers: ["".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let mut resolver = CorrectionResolver::in_memory(Box::new(prompt));
        assert_eq!(
            resolver.resolve("mystery", &symbols(), CorrectionPolicy::Interactive),
            ""
        );
        assert_eq!(resolver.cached("mystery"), Some(""));

        // a prompt that runs out of answers abandons as well
        let mut resolver = CorrectionResolver::in_memory(Box::new(ScriptedPrompt::default()));
        assert_eq!(
            resolver.resolve("mystery", &symbols(), CorrectionPolicy::Interactive),
            ""
        );
    }

    #[test]
    fn test_unloggable_symbol_stays_in_memory() {
        let td = tempdir().unwrap();
        let path = td.path().join("rescue_history.txt");
        let mut resolver =
            CorrectionResolver::with_log(&path, Box::new(HeadlessPrompt)).unwrap();
        assert_eq!(
            resolver.resolve("bad\tsymbol", &symbols(), CorrectionPolicy::Automatic),
            ""
        );
        assert_eq!(resolver.cached("bad\tsymbol"), Some(""));
        assert!(!path.exists());
    }

    #[test]
    fn test_log_file_is_created_on_first_append() {
        let td = tempdir().unwrap();
        let path = td.path().join("data").join("hgnc").join("rescue_history.txt");
        let mut resolver =
            CorrectionResolver::with_log(&path, Box::new(HeadlessPrompt)).unwrap();
        assert!(resolver.entries().is_empty());
        assert!(!td.path().join("data").exists());

        assert_eq!(resolver.resolve("rgs-4", &symbols(), CorrectionPolicy::Automatic), "RGS4");
        assert_eq!(log_lines(&path), vec!["rgs-4\tRGS4"]);
    }

    #[cfg(feature = "terminal-prompt")]
    #[test]
    fn test_terminal_prompt_answers() {
        assert!(accepts_suggestion(None));
        assert!(accepts_suggestion(Some("")));
        assert!(accepts_suggestion(Some(" y ")));
        assert!(!accepts_suggestion(Some("N")));
        assert!(!accepts_suggestion(Some(" n\n")));
    }

    #[cfg(feature = "terminal-prompt")]
    #[test]
    fn test_terminal_prompt_at_end_of_input_keeps_suggestion() {
        let closed = TerminalPrompt { read_line: |_| None };
        let mut resolver = CorrectionResolver::in_memory(Box::new(closed));
        assert_eq!(
            resolver.resolve("asic1", &symbols(), CorrectionPolicy::Interactive),
            "ASIC1"
        );
        assert_eq!(resolver.cached("asic1"), Some("ASIC1"));

        // pressing enter takes the default as well
        let enter = TerminalPrompt {
            read_line: |_| Some(String::new()),
        };
        let mut resolver = CorrectionResolver::in_memory(Box::new(enter));
        assert_eq!(
            resolver.resolve("hla-a", &symbols(), CorrectionPolicy::Interactive),
            "HLA-A"
        );

        // without a suggestion, end of input leaves the symbol unresolved
        let mut resolver = CorrectionResolver::in_memory(Box::new(closed));
        assert_eq!(
            resolver.resolve("mystery", &symbols(), CorrectionPolicy::Interactive),
            ""
        );
    }

    #[test]
    fn test_empty_symbol_is_not_corrected() {
        let mut resolver = CorrectionResolver::in_memory(Box::new(HeadlessPrompt));
        assert_eq!(resolver.resolve("", &symbols(), CorrectionPolicy::Automatic), "");
        assert!(resolver.entries().is_empty());
    }

    #[test]
    fn test_process_wide_settings() {
        let original = set_correction_settings(CorrectionSettings::default());
        let before = set_correction_policy(CorrectionPolicy::Interactive);
        assert_eq!(before, CorrectionSettings::default());
        let before = set_correction_enabled(false);
        assert_eq!(before.policy, CorrectionPolicy::Interactive);
        assert!(before.enabled);
        assert_eq!(
            correction_settings(),
            CorrectionSettings {
                enabled: false,
                policy: CorrectionPolicy::Interactive
            }
        );
        let previous = set_correction_settings(original);
        assert!(!previous.enabled);
        assert_eq!(correction_settings(), original);
    }
}
