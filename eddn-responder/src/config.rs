use std::str::FromStr;
use std::time;

use envconfig::Envconfig;

use crate::sender::UploaderIdentity;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    #[envconfig(from = "BIND_PORT", default = "3302")]
    pub port: u16,

    #[envconfig(default = "https://eddn.edcd.io:4430/upload/")]
    pub upload_url: String,

    #[envconfig(default = "anonymous")]
    pub uploader_id: NonEmptyString,

    #[envconfig(default = "eddn-responder")]
    pub software_name: NonEmptyString,

    #[envconfig(default = "0.1.0")]
    pub software_version: NonEmptyString,

    #[envconfig(default = "10000")]
    pub request_timeout: EnvMsDuration,

    #[envconfig(default = "false")]
    pub print_sink: bool,

    #[envconfig(default = "true")]
    pub export_prometheus: bool,
}

impl Config {
    /// Produce a host:port address for binding a TcpListener.
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn identity(&self) -> UploaderIdentity {
        UploaderIdentity {
            uploader_id: self.uploader_id.0.clone(),
            software_name: self.software_name.0.clone(),
            software_version: self.software_version.0.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

#[derive(Debug, Clone)]
pub struct NonEmptyString(pub String);

#[derive(Debug, PartialEq, Eq)]
pub struct StringIsEmptyError;

impl FromStr for NonEmptyString {
    type Err = StringIsEmptyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            Err(StringIsEmptyError)
        } else {
            Ok(NonEmptyString(s.to_owned()))
        }
    }
}
