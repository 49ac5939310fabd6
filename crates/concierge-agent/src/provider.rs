//! Provider selection and credential validation.
//!
//! Exactly one provider is enabled through a boolean env flag; the selection
//! is resolved once at startup into a [`ProviderKind`] and handed to the
//! driver explicitly. Components never read ambient provider state.

use colored::Colorize;
use thiserror::Error;

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Fatal provider-configuration errors, reported before any network activity.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(
        "no provider selected; enable exactly one of CONCIERGE_USE_OPENAI, \
         CONCIERGE_USE_CLAUDE, CONCIERGE_USE_GEMINI, CONCIERGE_USE_NOVA"
    )]
    NoneSelected,

    #[error("multiple providers selected ({}); enable exactly one", .0.join(", "))]
    MultipleSelected(Vec<&'static str>),

    #[error("missing credentials for {provider}: {}", .vars.join(", "))]
    MissingCredentials {
        provider: &'static str,
        vars: Vec<&'static str>,
    },
}

// ─────────────────────────────────────────────
// ProviderKind + flags
// ─────────────────────────────────────────────

/// A selectable model backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Claude,
    Gemini,
    Nova,
}

/// The raw selection flags read from the environment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProviderFlags {
    pub openai: bool,
    pub claude: bool,
    pub gemini: bool,
    pub nova: bool,
}

impl ProviderFlags {
    /// Read the four selection flags from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the flags through an injectable lookup (used by tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = |var: &str| {
            get(var)
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
        };
        ProviderFlags {
            openai: enabled("CONCIERGE_USE_OPENAI"),
            claude: enabled("CONCIERGE_USE_CLAUDE"),
            gemini: enabled("CONCIERGE_USE_GEMINI"),
            nova: enabled("CONCIERGE_USE_NOVA"),
        }
    }

    fn enabled_kinds(&self) -> Vec<ProviderKind> {
        let mut kinds = Vec::new();
        if self.openai {
            kinds.push(ProviderKind::OpenAi);
        }
        if self.claude {
            kinds.push(ProviderKind::Claude);
        }
        if self.gemini {
            kinds.push(ProviderKind::Gemini);
        }
        if self.nova {
            kinds.push(ProviderKind::Nova);
        }
        kinds
    }
}

impl ProviderKind {
    /// Resolve the selection flags into a single provider.
    ///
    /// Zero or multiple enabled flags is a fatal configuration error.
    pub fn resolve(flags: &ProviderFlags) -> Result<Self, ProviderError> {
        let enabled = flags.enabled_kinds();
        match enabled.as_slice() {
            [] => Err(ProviderError::NoneSelected),
            [kind] => Ok(*kind),
            many => Err(ProviderError::MultipleSelected(
                many.iter().map(|k| k.spec().display_name).collect(),
            )),
        }
    }

    /// The static spec for this provider.
    pub fn spec(self) -> &'static ProviderSpec {
        PROVIDERS
            .iter()
            .find(|s| s.kind == self)
            .expect("provider spec table covers every kind")
    }
}

// ─────────────────────────────────────────────
// Provider specs
// ─────────────────────────────────────────────

/// Static specification describing one provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Internal name (e.g. `"openai"`).
    pub name: &'static str,
    /// Human-readable name for logs and diagnostics.
    pub display_name: &'static str,
    /// Credential variables that must all be present and non-empty.
    pub required_vars: &'static [&'static str],
    /// Variable holding the bearer credential used by the HTTP runner.
    pub key_var: &'static str,
    /// Model served through this provider.
    pub model_name: &'static str,
    /// Qualifier prepended to the model identifier (e.g. `"openai"`).
    pub qualifier: &'static str,
    /// OpenAI-compatible API base. `None` means region-derived (Bedrock).
    pub api_base: Option<&'static str>,
}

/// All supported providers.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        kind: ProviderKind::OpenAi,
        name: "openai",
        display_name: "OpenAI",
        required_vars: &["OPENAI_API_KEY"],
        key_var: "OPENAI_API_KEY",
        model_name: "gpt-4o-mini",
        qualifier: "openai",
        api_base: Some("https://api.openai.com/v1"),
    },
    ProviderSpec {
        kind: ProviderKind::Claude,
        name: "claude",
        display_name: "Anthropic",
        required_vars: &["ANTHROPIC_API_KEY"],
        key_var: "ANTHROPIC_API_KEY",
        model_name: "claude-3-opus-20240229",
        qualifier: "claude",
        api_base: Some("https://api.anthropic.com/v1"),
    },
    ProviderSpec {
        kind: ProviderKind::Gemini,
        name: "gemini",
        display_name: "Google AI",
        required_vars: &["GOOGLE_API_KEY"],
        key_var: "GOOGLE_API_KEY",
        model_name: "gemini-pro",
        qualifier: "gemini",
        api_base: Some("https://generativelanguage.googleapis.com/v1beta/openai"),
    },
    ProviderSpec {
        kind: ProviderKind::Nova,
        name: "nova",
        display_name: "Amazon AWS",
        required_vars: &[
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "AWS_REGION_NAME",
        ],
        key_var: "AWS_SECRET_ACCESS_KEY",
        model_name: "amazon.nova-lite-v1:0",
        qualifier: "bedrock",
        api_base: None,
    },
];

// ─────────────────────────────────────────────
// Integration
// ─────────────────────────────────────────────

/// A validated provider integration.
///
/// Created once at startup; carries everything the runner needs to reach the
/// backend plus the provider-qualified model identifier.
#[derive(Debug)]
pub struct Integration {
    spec: &'static ProviderSpec,
    api_key: String,
    region: Option<String>,
}

impl Integration {
    /// Validate the credentials for `kind` against the process environment.
    ///
    /// Returns an error naming every missing variable; never panics and
    /// performs no network activity.
    pub fn validate(kind: ProviderKind) -> Result<Self, ProviderError> {
        Self::validate_from(kind, |var| std::env::var(var).ok())
    }

    /// Validate through an injectable lookup (used by tests).
    ///
    /// Empty values count as missing, matching shell `VAR=` exports.
    pub fn validate_from(
        kind: ProviderKind,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ProviderError> {
        let spec = kind.spec();
        let value = |var: &str| get(var).filter(|v| !v.trim().is_empty());

        let missing: Vec<&'static str> = spec
            .required_vars
            .iter()
            .copied()
            .filter(|var| value(var).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ProviderError::MissingCredentials {
                provider: spec.display_name,
                vars: missing,
            });
        }

        Ok(Integration {
            spec,
            api_key: value(spec.key_var).unwrap_or_default(),
            region: value("AWS_REGION_NAME"),
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.spec.kind
    }

    pub fn display_name(&self) -> &'static str {
        self.spec.display_name
    }

    /// The provider-qualified model identifier, e.g. `"openai/gpt-4o-mini"`.
    pub fn get_model(&self) -> String {
        format!("{}/{}", self.spec.qualifier, self.spec.model_name)
    }

    /// Bearer credential for the HTTP runner.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// OpenAI-compatible API base for this provider.
    ///
    /// Bedrock has no fixed base; it is derived from the configured region.
    pub fn api_base(&self) -> String {
        match self.spec.api_base {
            Some(base) => base.to_string(),
            None => {
                let region = self.region.as_deref().unwrap_or("us-east-1");
                format!("https://bedrock-runtime.{region}.amazonaws.com/openai/v1")
            }
        }
    }

    /// Print diagnostic details about the active integration.
    pub fn print_integration_info(&self) {
        println!();
        println!(
            "{}",
            format!("🤖 {} Integration", self.spec.display_name).cyan().bold()
        );
        println!("  {:<12} {}", "Model:".bold(), self.spec.model_name);
        println!("  {:<12} {}", "Provider:".bold(), self.spec.display_name);
        if let Some(region) = &self.region {
            println!("  {:<12} {}", "Region:".bold(), region);
        }
        println!("  {:<12} {}", "Status:".bold(), "active".green());
        println!();
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
