//! Judge model registry
//!
//! Maps a public judge name to a deferred constructor. Registration is pure
//! bookkeeping; nothing is contacted until a resolved factory is built.
//! Reachability is the probe's job and should be checked first.
//!
//! The registry is an explicit value: populate it during start-up, then hand
//! it (by reference) to whatever resolves judge names. Registration takes
//! `&mut self`, so concurrent writers need an external lock such as
//! `RwLock<JudgeRegistry>`.

use crate::error::{AppError, AppResult};
use crate::judge::{JudgeClient, JudgeConnection};
use std::collections::HashMap;

/// Sampling temperature applied when none is given
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

/// Attempts per judge request applied when none is given
pub const DEFAULT_RETRY_BUDGET: u32 = 10;

/// Constructor defaults captured at registration
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeSettings {
    model: String,
    temperature: f64,
    retry_budget: u32,
    verbose: bool,
}

impl JudgeSettings {
    /// Settings for `model` with temperature 0, a retry budget of 10 and quiet logging
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            retry_budget: DEFAULT_RETRY_BUDGET,
            verbose: false,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Underlying model id sent as `model` in chat requests
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Deferred judge constructor
///
/// Resolving a name hands back this factory; the HTTP client (and its
/// connection pool) only comes into existence when [`JudgeFactory::build`]
/// is called.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeFactory {
    public_name: String,
    settings: JudgeSettings,
}

impl JudgeFactory {
    pub fn public_name(&self) -> &str {
        &self.public_name
    }

    pub fn settings(&self) -> &JudgeSettings {
        &self.settings
    }

    /// Construct the judge against `connection` with the captured settings
    pub fn build(&self, connection: &JudgeConnection) -> AppResult<JudgeClient> {
        tracing::debug!(
            judge = %self.public_name,
            model = %self.settings.model,
            "Constructing judge client"
        );
        JudgeClient::new(self.settings.clone(), connection)
    }
}

/// Public judge name → deferred constructor
#[derive(Debug, Default, Clone)]
pub struct JudgeRegistry {
    entries: HashMap<String, JudgeFactory>,
}

impl JudgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `public_name`, replacing any existing entry with that name
    pub fn register(&mut self, public_name: impl Into<String>, settings: JudgeSettings) {
        let public_name = public_name.into();
        let factory = JudgeFactory {
            public_name: public_name.clone(),
            settings,
        };
        if let Some(previous) = self.entries.insert(public_name, factory) {
            tracing::debug!(
                judge = %previous.public_name,
                previous_model = %previous.settings.model,
                "Judge re-registered, previous entry replaced"
            );
        }
    }

    /// Register each `(public_name, underlying_model_id)` with the fixed defaults
    ///
    /// Entries are applied in order, so a later duplicate name wins.
    pub fn bulk_register<I, N, M>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (N, M)>,
        N: Into<String>,
        M: Into<String>,
    {
        let mut count = 0usize;
        for (public_name, model) in entries {
            self.register(public_name, JudgeSettings::new(model));
            count += 1;
        }
        tracing::info!(count, total = self.entries.len(), "Registered judge models");
    }

    /// Look up a factory without constructing anything
    ///
    /// # Errors
    ///
    /// Returns `AppError::JudgeNotFound` for names never registered.
    pub fn resolve(&self, public_name: &str) -> AppResult<&JudgeFactory> {
        self.entries
            .get(public_name)
            .ok_or_else(|| AppError::JudgeNotFound(public_name.to_string()))
    }

    pub fn contains(&self, public_name: &str) -> bool {
        self.entries.contains_key(public_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
