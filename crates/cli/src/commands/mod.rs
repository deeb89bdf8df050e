use clap::Subcommand;
use std::path::PathBuf;

pub mod check;
pub mod dispatch;
pub mod key;

#[derive(Subcommand)]
pub enum Commands {
    /// Decide whether claims may perform an operation on a resource
    #[command(visible_alias = "c")]
    Check {
        /// Policy document (JSON)
        #[arg(short, long)]
        policies: PathBuf,

        /// Namespace the request targets
        #[arg(short, long)]
        namespace: String,

        /// Resource (object identity) the request targets
        #[arg(short, long)]
        resource: String,

        /// Operation to perform (get, post, put, delete, ...)
        #[arg(short, long, default_value = "get")]
        operation: String,

        /// Caller claim as key=value (can be specified multiple times)
        #[arg(long = "claim", value_parser = crate::loader::parse_claim)]
        claims: Vec<String>,

        /// Source address of the caller
        #[arg(long)]
        source_ip: Option<String>,

        /// Identifier of the targeted object
        #[arg(long)]
        id: Option<String>,

        /// Credential whose restrictions narrow the decision
        #[arg(long)]
        token: Option<String>,
    },

    /// Decide whether a change event is delivered to a push session
    #[command(visible_alias = "d")]
    Dispatch {
        /// Policy document (JSON)
        #[arg(short, long)]
        policies: PathBuf,

        /// Change event (JSON) with identity, type and entity
        #[arg(short, long)]
        event: PathBuf,

        /// Namespace the push session listens on
        #[arg(short, long)]
        namespace: String,

        /// Also receive events from descendant namespaces
        #[arg(long)]
        recursive: bool,

        /// Session claim as key=value (can be specified multiple times)
        #[arg(long = "claim", value_parser = crate::loader::parse_claim)]
        claims: Vec<String>,

        /// Client address of the session
        #[arg(long)]
        client_ip: Option<String>,

        /// Credential the session was opened with
        #[arg(long)]
        token: Option<String>,
    },

    /// Print the decision cache key for a request context
    Key {
        /// Namespace the request targets
        #[arg(short, long)]
        namespace: String,

        /// Caller claim as key=value (can be specified multiple times)
        #[arg(long = "claim", value_parser = crate::loader::parse_claim)]
        claims: Vec<String>,

        /// Source address of the caller
        #[arg(long, default_value = "")]
        source_ip: String,

        /// Identifier of the targeted object
        #[arg(long, default_value = "")]
        id: String,
    },
}

/// Outcome of a command, mapped to the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    Denied,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Allowed => 0,
            Outcome::Denied => 1,
        }
    }
}

impl From<bool> for Outcome {
    fn from(allowed: bool) -> Self {
        if allowed {
            Outcome::Allowed
        } else {
            Outcome::Denied
        }
    }
}

impl Commands {
    pub async fn execute(self) -> anyhow::Result<Outcome> {
        match self {
            Commands::Check {
                policies,
                namespace,
                resource,
                operation,
                claims,
                source_ip,
                id,
                token,
            } => {
                let request = check::CheckRequest {
                    namespace,
                    resource,
                    operation,
                    claims,
                    source_ip,
                    id,
                    token,
                };
                check::execute(&policies, request).await
            }
            Commands::Dispatch {
                policies,
                event,
                namespace,
                recursive,
                claims,
                client_ip,
                token,
            } => {
                let mut session = nsgate_authz::PushSession::new(namespace).with_claims(claims);
                if recursive {
                    session = session.recursive();
                }
                if let Some(client_ip) = client_ip {
                    session = session.with_client_ip(client_ip);
                }
                if let Some(token) = token {
                    session = session.with_credential(token);
                }
                dispatch::execute(&policies, &event, &session).await
            }
            Commands::Key {
                namespace,
                claims,
                source_ip,
                id,
            } => {
                println!("{}", key::render(&namespace, &claims, &source_ip, &id));
                Ok(Outcome::Allowed)
            }
        }
    }
}
