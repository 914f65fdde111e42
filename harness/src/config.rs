//! Run configuration from flags and environment variables
//!
//! Every input has a long flag and a `CBTEST_*` environment variable. The
//! environment supplies the default and an explicit flag wins over it. An
//! empty variable counts as unset.

use std::convert::Infallible;
use std::ffi::OsString;
use std::path::PathBuf;

use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use shared::BackendMode;
use shared::logging::LogSettings;

use crate::core::features::{FeatureDirective, parse_feature_directives};
use crate::error::{HarnessError, HarnessResult};

const DEFAULT_BUCKET: &str = "default";

/// Inputs that only make sense when an environment is resolved
const ENVIRONMENT_ARGS: &[(&str, &str)] = &[
    ("server", "--server"),
    ("user", "--user"),
    ("password", "--pass"),
    ("bucket", "--bucket"),
    ("version", "--version"),
    ("collection_name", "--collection-name"),
    ("scope_name", "--scope-name"),
];

#[derive(Parser, Debug)]
#[command(name = "cbtest")]
#[command(about = "Runs a client integration-test suite against a real or mock cluster")]
#[command(disable_version_flag = true)]
pub struct Args {
    /// Connection string of a real cluster; empty starts a mock
    #[arg(long, env = "CBTEST_SERVER", default_value = "")]
    pub server: String,

    /// Username for the real cluster
    #[arg(long, env = "CBTEST_USER", default_value = "")]
    pub user: String,

    /// Password for the real cluster
    #[arg(long = "pass", env = "CBTEST_PASS", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Bucket under test
    #[arg(long, env = "CBTEST_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Server version, e.g. 7.2.0-5325-enterprise
    #[arg(long, env = "CBTEST_VERSION", default_value = "")]
    pub version: String,

    /// Collection under test
    #[arg(long, env = "CBTEST_COLL", default_value = "")]
    pub collection_name: String,

    /// Scope under test
    #[arg(long, env = "CBTEST_SCOPE", default_value = "")]
    pub scope_name: String,

    /// Feature directives such as +txn,-query
    #[arg(long, env = "CBTEST_FEATURES", default_value = "")]
    pub features: String,

    /// Keep the client and the mock at warning level
    #[arg(long, env = "CBTEST_NOLOG", action = ArgAction::SetTrue, value_parser = parse_env_flag)]
    pub disable_logger: bool,

    /// Run offline, without resolving an environment
    #[arg(long, env = "CBTEST_SHORT", action = ArgAction::SetTrue, value_parser = parse_env_flag)]
    pub short: bool,

    /// Location of the mock jar
    #[arg(long, env = "CBTEST_MOCK_PATH", default_value = "")]
    pub mock_path: String,

    /// Arguments after `--`, handed to the suite untouched
    #[arg(last = true)]
    pub suite_args: Vec<String>,
}

/// Immutable snapshot of the resolved inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub server: String,
    pub username: String,
    pub password: String,
    pub bucket: String,
    pub version: Option<String>,
    pub collection: Option<String>,
    pub scope: Option<String>,
    pub features: Vec<FeatureDirective>,
    pub disable_logger: bool,
    pub offline: bool,
    pub mock_path: Option<PathBuf>,
    pub suite_args: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            username: String::new(),
            password: String::new(),
            bucket: DEFAULT_BUCKET.to_string(),
            version: None,
            collection: None,
            scope: None,
            features: Vec::new(),
            disable_logger: false,
            offline: false,
            mock_path: None,
            suite_args: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Parse flags (the first item is the program name) and the environment
    pub fn from_args<I, T>(args: I) -> HarnessResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Args::command().try_get_matches_from(args)?;
        let mut parsed = Args::from_arg_matches(&matches)?;
        if from_empty_env(&matches, "bucket") {
            parsed.bucket = DEFAULT_BUCKET.to_string();
        }

        if parsed.short {
            reject_environment_flags(&matches)?;
        }

        let features = parse_feature_directives(&parsed.features)?;
        Ok(Self::from_parsed(parsed, features))
    }

    fn from_parsed(args: Args, features: Vec<FeatureDirective>) -> Self {
        Self {
            server: args.server,
            username: args.user,
            password: args.password,
            bucket: args.bucket,
            version: non_empty(args.version),
            collection: non_empty(args.collection_name),
            scope: non_empty(args.scope_name),
            features,
            disable_logger: args.disable_logger,
            offline: args.short,
            mock_path: non_empty(args.mock_path).map(PathBuf::from),
            suite_args: args.suite_args,
        }
    }

    /// Mock when no server address was supplied
    pub fn mode(&self) -> BackendMode {
        if self.server.is_empty() {
            BackendMode::Mock
        } else {
            BackendMode::Real
        }
    }

    pub fn log_settings(&self) -> LogSettings {
        LogSettings::new(!self.disable_logger)
    }

    /// Target a real cluster (fluent API)
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Configure credentials (fluent API)
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_features(mut self, features: Vec<FeatureDirective>) -> Self {
        self.features = features;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Arguments handed to the suite (fluent API)
    pub fn with_suite_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.suite_args = args.into_iter().map(Into::into).collect();
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Boolean environment values: empty, `0` and `false` in any case are false
fn parse_env_flag(value: &str) -> Result<bool, Infallible> {
    Ok(!(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false")))
}

fn from_empty_env(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::EnvVariable)
        && matches
            .get_raw(id)
            .is_some_and(|mut values| values.all(|value| value.is_empty()))
}

fn reject_environment_flags(matches: &ArgMatches) -> HarnessResult<()> {
    let supplied: Vec<&str> = ENVIRONMENT_ARGS
        .iter()
        .filter(|(id, _)| matches.value_source(id) == Some(ValueSource::CommandLine))
        .map(|(_, flag)| *flag)
        .collect();

    if supplied.is_empty() {
        return Ok(());
    }
    Err(HarnessError::configuration(format!(
        "{} cannot be used in short mode",
        supplied.join(", ")
    )))
}
