/// How portability notices about non-POSIX constructs are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portability {
    Ignore,
    Warn,
    Error,
}

impl Default for Portability {
    fn default() -> Self {
        Portability::Ignore
    }
}

/// ## Runtime options

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub portability: Portability,
    /// Render compiled units as text instead of running them.
    pub compile_only: bool,
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    pub fn portability(mut self, portability: Portability) -> Config {
        self.portability = portability;
        self
    }

    pub fn compile_only(mut self, compile_only: bool) -> Config {
        self.compile_only = compile_only;
        self
    }
}
