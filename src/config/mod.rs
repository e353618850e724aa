pub mod credentials;
pub mod settings;

pub use credentials::{CredentialDiagnostic, EnvSource, ProcessEnv, ResolvedCredentials, Secret};
pub use settings::{HttpSettings, LogFormat, LogSettings, Settings, SettingsOverrides};
