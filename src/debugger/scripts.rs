use indexmap::IndexMap;

/// Bare module names that ship inside the runtime.
const BUILTIN_MODULES: &[&str] = &[
    "assert", "buffer", "child_process", "cluster", "console", "constants", "crypto", "dgram",
    "dns", "domain", "events", "fs", "http", "http2", "https", "module", "net", "os", "path",
    "perf_hooks", "process", "punycode", "querystring", "readline", "repl", "stream",
    "string_decoder", "sys", "timers", "tls", "tty", "url", "util", "v8", "vm", "worker_threads",
    "zlib",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub id: String,
    pub url: String,
    pub is_native: bool,
}

impl Script {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let is_native = is_native_url(&url);
        Self {
            id: id.into(),
            url,
            is_native,
        }
    }
}

/// True for urls that name a runtime-internal module rather than user code.
pub fn is_native_url(url: &str) -> bool {
    url.starts_with("node:")
        || url.starts_with("internal/")
        || url == "bootstrap_node.js"
        || BUILTIN_MODULES
            .iter()
            .any(|name| url.strip_suffix(".js").unwrap_or(url) == *name)
}

/// Result of resolving a user-supplied script name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptMatch<'a> {
    Found(&'a Script),
    Ambiguous(Vec<&'a Script>),
    NotLoaded,
}

/// Scripts known to the current connection, in load order.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    scripts: IndexMap<String, Script>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the record for `id`. Returns false when an
    /// identical record was already present.
    pub fn register(&mut self, id: &str, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        if let Some(existing) = self.scripts.get(id) {
            if existing.url == url {
                return false;
            }
        }
        self.scripts.insert(id.to_string(), Script::new(id, url));
        true
    }

    pub fn lookup(&self, id: &str) -> Option<&Script> {
        self.scripts.get(id)
    }

    pub fn find_by_url_substring(&self, text: &str) -> Vec<&Script> {
        self.scripts
            .values()
            .filter(|script| script.url.contains(text))
            .collect()
    }

    /// Exact id or url wins outright; otherwise a unique substring match.
    pub fn resolve_name(&self, name: &str) -> ScriptMatch<'_> {
        if let Some(script) = self.scripts.get(name) {
            return ScriptMatch::Found(script);
        }
        if let Some(script) = self.scripts.values().find(|script| script.url == name) {
            return ScriptMatch::Found(script);
        }

        let mut candidates = self.find_by_url_substring(name);
        match candidates.len() {
            0 => ScriptMatch::NotLoaded,
            1 => ScriptMatch::Found(candidates.remove(0)),
            _ => ScriptMatch::Ambiguous(candidates),
        }
    }

    pub fn reset(&mut self) {
        self.scripts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Script> {
        self.scripts.values()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
