//! Sweep aggregation and the operator-facing summary

use super::{ProbeMode, ProbeOutcome, ProbeResult};
use std::fmt;

/// Result of one model-listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogListing {
    version: Option<String>,
    url: String,
    models: Result<Vec<String>, String>,
}

impl CatalogListing {
    pub fn new(version: Option<String>, url: String, models: Result<Vec<String>, String>) -> Self {
        Self {
            version,
            url,
            models,
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn models(&self) -> Result<&[String], &str> {
        match &self.models {
            Ok(models) => Ok(models),
            Err(reason) => Err(reason),
        }
    }
}

/// Most likely explanation for a sweep's aggregate outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    /// At least one combination worked
    Working,
    /// Nothing worked and at least one attempt was rejected with 401/403
    ///
    /// Reported ahead of "not found": a bad key tends to surface as a mix of
    /// auth rejections and misses depending on provider routing.
    AuthorizationLikely,
    /// Every attempt returned 404
    ModelsNotFound,
    /// No attempt received an HTTP response
    Unreachable,
    /// Nothing worked; a mix of server errors, misses and transport failures
    Failing,
}

/// Aggregate of a probe sweep plus optional catalog listings
#[derive(Debug, Clone)]
pub struct ProbeReport {
    mode: ProbeMode,
    base_url: String,
    results: Vec<ProbeResult>,
    catalogs: Vec<CatalogListing>,
}

impl ProbeReport {
    pub fn new(mode: ProbeMode, base_url: impl Into<String>, results: Vec<ProbeResult>) -> Self {
        Self {
            mode,
            base_url: base_url.into(),
            results,
            catalogs: Vec::new(),
        }
    }

    pub fn push_catalog(&mut self, listing: CatalogListing) {
        self.catalogs.push(listing);
    }

    pub fn mode(&self) -> ProbeMode {
        self.mode
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every attempt, in sweep order
    pub fn results(&self) -> &[ProbeResult] {
        &self.results
    }

    pub fn catalogs(&self) -> &[CatalogListing] {
        &self.catalogs
    }

    pub fn successes(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.succeeded())
    }

    /// First success in priority order
    pub fn recommended(&self) -> Option<&ProbeResult> {
        self.results.iter().find(|r| r.succeeded())
    }

    pub fn is_success(&self) -> bool {
        self.recommended().is_some()
    }

    pub fn diagnosis(&self) -> Diagnosis {
        if self.is_success() {
            return Diagnosis::Working;
        }
        let has = |outcome: ProbeOutcome| self.results.iter().any(|r| r.outcome() == outcome);
        let all = |outcome: ProbeOutcome| self.results.iter().all(|r| r.outcome() == outcome);

        if has(ProbeOutcome::Unauthorized) {
            Diagnosis::AuthorizationLikely
        } else if all(ProbeOutcome::NotFound) {
            Diagnosis::ModelsNotFound
        } else if all(ProbeOutcome::TransportError) {
            Diagnosis::Unreachable
        } else {
            Diagnosis::Failing
        }
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Probe of {} ({} mode)", self.base_url, self.mode)?;
        writeln!(f, "---------------------------------------------------")?;

        for result in &self.results {
            let version = result.version_used().unwrap_or("-");
            let status = match result.status_code() {
                Some(code) => code.to_string(),
                None => "---".to_string(),
            };
            let mark = match result.outcome() {
                ProbeOutcome::Success => "ok  ",
                ProbeOutcome::NotFound => "miss",
                ProbeOutcome::Unauthorized => "auth",
                ProbeOutcome::HttpError | ProbeOutcome::TransportError => "fail",
            };
            write!(
                f,
                "[{}] {:<8} {:<40} {}",
                mark,
                version,
                result.candidate().public_id(),
                status
            )?;
            match result.raw_error() {
                Some(reason) if !reason.is_empty() && !result.succeeded() => {
                    writeln!(f, "  {}", reason.replace('\n', " "))?
                }
                _ => writeln!(f)?,
            }
        }

        for catalog in &self.catalogs {
            writeln!(f)?;
            match catalog.models() {
                Ok(models) => {
                    writeln!(f, "Models advertised at {}:", catalog.url())?;
                    for model in models {
                        writeln!(f, " - {}", model)?;
                    }
                }
                Err(reason) => writeln!(f, "Listing {} failed: {}", catalog.url(), reason)?,
            }
        }

        writeln!(f, "---------------------------------------------------")?;
        match self.diagnosis() {
            Diagnosis::Working => {
                let working: Vec<String> = self
                    .successes()
                    .map(|r| match r.version_used() {
                        Some(v) => format!("{} ({})", r.candidate(), v),
                        None => r.candidate().to_string(),
                    })
                    .collect();
                writeln!(f, "Working models: {}", working.join(", "))?;
                if let Some(best) = self.recommended() {
                    write!(
                        f,
                        "RECOMMENDATION: use '{}' as your judge model",
                        best.candidate()
                    )?;
                    match best.version_used() {
                        Some(v) => writeln!(f, " via API version '{}'.", v)?,
                        None => writeln!(f, ".")?,
                    }
                }
            }
            Diagnosis::AuthorizationLikely => {
                writeln!(f, "No models worked.")?;
                writeln!(
                    f,
                    "Likely cause: authorization. The endpoint rejected the credential (401/403); \
                     check that the API key is valid for this base URL."
                )?;
            }
            Diagnosis::ModelsNotFound => {
                writeln!(f, "No models worked.")?;
                writeln!(
                    f,
                    "Every combination returned 404. Check the exact model names with your \
                     provider and whether the base URL needs a different API path."
                )?;
            }
            Diagnosis::Unreachable => {
                writeln!(f, "No models worked.")?;
                writeln!(
                    f,
                    "The endpoint never answered. Check the base URL, network access and timeouts."
                )?;
            }
            Diagnosis::Failing => {
                writeln!(f, "No models worked.")?;
                writeln!(
                    f,
                    "The endpoint answered with errors. Check your API provider for exact model names \
                     and service status."
                )?;
            }
        }
        Ok(())
    }
}
