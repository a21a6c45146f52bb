//! Server configuration and command line parsing.

use crate::error::ConfigError;
use crate::registry::{
    AllocationPolicy, DEFAULT_IDENTITY_SPACE, DEFAULT_MAX_CONNECTIONS, MAX_IDENTITY_SPACE,
};
use clap::Parser;
use shared::{GameVariant, DEFAULT_PORT};
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

pub const MIN_PLAYERS: i64 = 2;
pub const MAX_PLAYERS: i64 = 9;
/// Upper bound for simultaneous connections.
pub const MAX_CONNECTIONS: usize = 25;

/// Command line of the server binary
#[derive(Parser, Debug)]
#[clap(author, version, about = "Multiplayer Nim game server")]
pub struct Args {
    /// Number of players (2-9); later clients watch
    #[clap(allow_negative_numbers = true)]
    pub players: i64,
    /// Initial size of each of the four heaps
    pub heap_size: u16,
    /// 0 for a regular game, anything else for misère
    #[clap(allow_negative_numbers = true)]
    pub misere: i64,
    /// Port to listen on
    #[clap(default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,
    /// Most clients connected at once
    #[clap(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,
    /// Number of distinct client identities
    #[clap(long, default_value_t = DEFAULT_IDENTITY_SPACE)]
    pub identity_space: usize,
    /// Never reuse the identity of a client that left
    #[clap(long)]
    pub monotonic_ids: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub players: usize,
    pub heap_size: u16,
    pub variant: GameVariant,
    pub address: SocketAddr,
    pub max_connections: usize,
    pub identity_space: usize,
    pub policy: AllocationPolicy,
}

impl ServerConfig {
    /// Configuration with default limits, listening on all interfaces.
    pub fn new(players: i64, heap_size: u16, variant: GameVariant) -> Result<Self, ConfigError> {
        let config = Self {
            players: check_players(players)?,
            heap_size,
            variant,
            address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            identity_space: DEFAULT_IDENTITY_SPACE,
            policy: AllocationPolicy::default(),
        };
        Ok(config)
    }

    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    pub fn with_limits(
        mut self,
        max_connections: usize,
        identity_space: usize,
    ) -> Result<Self, ConfigError> {
        self.max_connections = max_connections;
        self.identity_space = identity_space;
        self.validate()?;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: AllocationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let address = resolve(&args.host, args.port)?;
        let policy = if args.monotonic_ids {
            AllocationPolicy::Monotonic
        } else {
            AllocationPolicy::LowestFree
        };

        Self::new(args.players, args.heap_size, GameVariant::from_flag(args.misere))?
            .with_address(address)
            .with_policy(policy)
            .with_limits(args.max_connections, args.identity_space)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_players(self.players as i64)?;
        if !(1..=MAX_CONNECTIONS).contains(&self.max_connections) {
            return Err(ConfigError::ConnectionLimit {
                got: self.max_connections,
                max: MAX_CONNECTIONS,
            });
        }
        if !(1..=MAX_IDENTITY_SPACE).contains(&self.identity_space) {
            return Err(ConfigError::IdentitySpace {
                got: self.identity_space,
                max: MAX_IDENTITY_SPACE,
            });
        }
        Ok(())
    }
}

fn check_players(players: i64) -> Result<usize, ConfigError> {
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
        return Err(ConfigError::PlayerCount(players));
    }
    Ok(players as usize)
}

fn resolve(host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let invalid = || ConfigError::Address(format!("{}:{}", host, port));
    (host, port)
        .to_socket_addrs()
        .map_err(|_| invalid())?
        .next()
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ServerConfig, ConfigError> {
        let args = Args::try_parse_from(std::iter::once("server").chain(args.iter().copied()))
            .expect("arguments parse");
        ServerConfig::from_args(&args)
    }

    #[test]
    fn test_positional_arguments() {
        let config = parse(&["3", "10", "1", "7000"]).unwrap();
        assert_eq!(config.players, 3);
        assert_eq!(config.heap_size, 10);
        assert_eq!(config.variant, GameVariant::Misere);
        assert_eq!(config.address, "0.0.0.0:7000".parse().unwrap());
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.identity_space, DEFAULT_IDENTITY_SPACE);
        assert_eq!(config.policy, AllocationPolicy::LowestFree);
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["2", "5", "0"]).unwrap();
        assert_eq!(config.variant, GameVariant::Normal);
        assert_eq!(config.address.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_options() {
        let config = parse(&[
            "2",
            "5",
            "-3",
            "--host",
            "127.0.0.1",
            "--max-connections",
            "4",
            "--identity-space",
            "40",
            "--monotonic-ids",
        ])
        .unwrap();
        assert_eq!(config.variant, GameVariant::Misere);
        assert_eq!(config.address, "127.0.0.1:6325".parse().unwrap());
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.identity_space, 40);
        assert_eq!(config.policy, AllocationPolicy::Monotonic);
    }

    #[test]
    fn test_player_count_bounds() {
        assert_eq!(parse(&["1", "5", "0"]), Err(ConfigError::PlayerCount(1)));
        assert_eq!(parse(&["10", "5", "0"]), Err(ConfigError::PlayerCount(10)));
        assert_eq!(parse(&["-2", "5", "0"]), Err(ConfigError::PlayerCount(-2)));
        assert!(parse(&["9", "5", "0"]).is_ok());
    }

    #[test]
    fn test_limit_bounds() {
        assert_eq!(
            parse(&["2", "5", "0", "--max-connections", "0"]),
            Err(ConfigError::ConnectionLimit { got: 0, max: 25 })
        );
        assert_eq!(
            parse(&["2", "5", "0", "--identity-space", "101"]),
            Err(ConfigError::IdentitySpace { got: 101, max: 100 })
        );
    }

    #[test]
    fn test_missing_arguments_rejected() {
        assert!(Args::try_parse_from(["server", "2", "5"]).is_err());
        assert!(Args::try_parse_from(["server", "2", "-5", "0"]).is_err());
    }
}
