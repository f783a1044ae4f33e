//! Common types used throughout the planner
//!
//! Amounts are always carried in the chain's smallest unit (sun for TRX,
//! 10^-decimals for tokens). Conversion to display units happens only at the
//! reporting edge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest TRX unit
pub type Sun = u64;

/// Number of sun in one TRX
pub const SUN_PER_TRX: Sun = 1_000_000;

/// Decimals of the native TRX coin
pub const TRX_DECIMALS: u8 = 6;

/// Chain address in its canonical text form (base58check for TRON)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address, stripping surrounding whitespace
    pub fn new(s: impl Into<String>) -> Self {
        let s: String = s.into();
        Self(s.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Which adapter family serves a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterKind {
    Evm,
    Tron,
    Solana,
}

/// Identifier of a known network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    Ethereum,
    Bnb,
    Arbitrum,
    Linea,
    Solana,
    Tron,
    Holesky,
    Sepolia,
}

impl NetworkId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkId::Ethereum => "ethereum",
            NetworkId::Bnb => "bnb",
            NetworkId::Arbitrum => "arbitrum",
            NetworkId::Linea => "linea",
            NetworkId::Solana => "solana",
            NetworkId::Tron => "tron",
            NetworkId::Holesky => "holesky",
            NetworkId::Sepolia => "sepolia",
        }
    }

    /// Static descriptor for this network
    pub fn network(&self) -> &'static Network {
        // NETWORKS is ordered and exhaustive over NetworkId
        NETWORKS
            .iter()
            .find(|n| n.id == *self)
            .unwrap_or(&NETWORKS[0])
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Self::Ethereum),
            "bnb" | "bsc" => Ok(Self::Bnb),
            "arbitrum" | "arb" => Ok(Self::Arbitrum),
            "linea" => Ok(Self::Linea),
            "solana" | "sol" => Ok(Self::Solana),
            "tron" | "trx" => Ok(Self::Tron),
            "holesky" => Ok(Self::Holesky),
            "sepolia" => Ok(Self::Sepolia),
            _ => Err(format!("Unknown network: {s}")),
        }
    }
}

/// Static network descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: NetworkId,
    pub name: &'static str,
    pub rpc: &'static [&'static str],
    pub chain_id: Option<u64>,
    pub symbol: &'static str,
    pub decimals: u8,
    pub adapter: AdapterKind,
    pub testnet: bool,
    /// SLIP-44 coin id, used by wallet deep links
    pub coin_id: Option<u32>,
}

/// Known networks
pub static NETWORKS: &[Network] = &[
    Network {
        id: NetworkId::Ethereum,
        name: "Ethereum",
        rpc: &["https://eth.llamarpc.com"],
        chain_id: Some(1),
        symbol: "ETH",
        decimals: 18,
        adapter: AdapterKind::Evm,
        testnet: false,
        coin_id: Some(60),
    },
    Network {
        id: NetworkId::Bnb,
        name: "Binance Smart Chain",
        rpc: &["https://bsc-dataseed.binance.org/"],
        chain_id: Some(56),
        symbol: "BNB",
        decimals: 18,
        adapter: AdapterKind::Evm,
        testnet: false,
        coin_id: None,
    },
    Network {
        id: NetworkId::Arbitrum,
        name: "Arbitrum",
        rpc: &["https://arb1.arbitrum.io/rpc"],
        chain_id: Some(42161),
        symbol: "ETH",
        decimals: 18,
        adapter: AdapterKind::Evm,
        testnet: false,
        coin_id: None,
    },
    Network {
        id: NetworkId::Linea,
        name: "Linea",
        rpc: &["https://rpc.linea.io"],
        chain_id: Some(59144),
        symbol: "ETH",
        decimals: 18,
        adapter: AdapterKind::Evm,
        testnet: false,
        coin_id: None,
    },
    Network {
        id: NetworkId::Solana,
        name: "Solana",
        rpc: &["https://api.mainnet-beta.solana.com"],
        chain_id: None,
        symbol: "SOL",
        decimals: 9,
        adapter: AdapterKind::Solana,
        testnet: false,
        coin_id: Some(501),
    },
    Network {
        id: NetworkId::Tron,
        name: "TRON",
        rpc: &["https://api.trongrid.io"],
        chain_id: None,
        symbol: "TRX",
        decimals: TRX_DECIMALS,
        adapter: AdapterKind::Tron,
        testnet: false,
        coin_id: Some(195),
    },
    Network {
        id: NetworkId::Holesky,
        name: "Holesky",
        rpc: &[
            "https://ethereum-holesky-rpc.publicnode.com/",
            "https://rpc.holesky.ethpandaops.io",
        ],
        chain_id: Some(17000),
        symbol: "ETH",
        decimals: 18,
        adapter: AdapterKind::Evm,
        testnet: true,
        coin_id: None,
    },
    Network {
        id: NetworkId::Sepolia,
        name: "Sepolia",
        rpc: &["https://rpc.sepolia.org", "https://rpc.sepolia.dev"],
        chain_id: Some(11155111),
        symbol: "ETH",
        decimals: 18,
        adapter: AdapterKind::Evm,
        testnet: true,
        coin_id: None,
    },
];

/// Fungible token deployed on a network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Contract address
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: impl Into<Address>, symbol: &str, decimals: u8) -> Self {
        Self {
            address: address.into(),
            symbol: symbol.to_string(),
            decimals,
        }
    }

    /// Tether USD on TRON mainnet
    pub fn tron_usdt() -> Self {
        Self::new("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t", "USDT", 6)
    }

    /// Look up a well-known token by symbol
    pub fn lookup(network: NetworkId, symbol: &str) -> Option<Self> {
        match (network, symbol.to_uppercase().as_str()) {
            (NetworkId::Tron, "USDT") => Some(Self::tron_usdt()),
            _ => None,
        }
    }
}

/// Snapshot of an account's TRON resources
///
/// Always a fresh read: resources regenerate per block window and after
/// rentals, so a snapshot is never reused across two fee computations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResourceSnapshot {
    pub energy_limit: u64,
    pub energy_used: u64,
    pub free_bandwidth_limit: u64,
    pub free_bandwidth_used: u64,
    pub staked_bandwidth_limit: u64,
    pub staked_bandwidth_used: u64,
}

impl AccountResourceSnapshot {
    /// Snapshot of an account that does not exist on-chain yet
    pub fn empty() -> Self {
        Self::default()
    }

    /// Energy left in the current window, never negative
    pub fn available_energy(&self) -> u64 {
        self.energy_limit.saturating_sub(self.energy_used)
    }

    /// Signed difference between required and available energy, saturating
    /// at the `i64` bounds
    pub fn energy_shortfall(&self, required: u64) -> i64 {
        let diff = i128::from(required) - i128::from(self.available_energy());
        i64::try_from(diff).unwrap_or(if diff < 0 { i64::MIN } else { i64::MAX })
    }

    /// Free plus staked bandwidth left, never negative
    pub fn available_bandwidth(&self) -> u64 {
        let limit = self
            .free_bandwidth_limit
            .saturating_add(self.staked_bandwidth_limit);
        let used = self
            .free_bandwidth_used
            .saturating_add(self.staked_bandwidth_used);
        limit.saturating_sub(used)
    }
}

/// Format a smallest-unit amount with the given decimals ("12.500000")
pub fn format_units(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(decimals as u32);
    let amount = amount as u128;
    format!(
        "{}.{:0width$}",
        amount / scale,
        amount % scale,
        width = decimals as usize
    )
}

/// Parse a decimal string ("12.5") into smallest units
pub fn parse_units(text: &str, decimals: u8) -> Result<u64, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty amount".to_string());
    }
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if frac.len() > decimals as usize {
        return Err(format!(
            "amount {text} has more than {decimals} decimal places"
        ));
    }
    let digits_ok = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !digits_ok(whole) || !digits_ok(frac) || (whole.is_empty() && frac.is_empty()) {
        return Err(format!("invalid amount: {text}"));
    }

    let scale = 10u128.pow(decimals as u32);
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| format!("invalid amount: {text}"))?
    };
    let frac_value: u128 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        padded.parse().map_err(|_| format!("invalid amount: {text}"))?
    };

    let total = whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac_value))
        .ok_or_else(|| format!("amount {text} overflows"))?;
    u64::try_from(total).map_err(|_| format!("amount {text} overflows"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_energy_clamps_at_zero() {
        let snapshot = AccountResourceSnapshot {
            energy_limit: 100,
            energy_used: 250,
            ..Default::default()
        };
        assert_eq!(snapshot.available_energy(), 0);
        assert_eq!(snapshot.energy_shortfall(50), 50);
    }

    #[test]
    fn test_energy_shortfall_saturates() {
        let empty = AccountResourceSnapshot::empty();
        assert_eq!(empty.energy_shortfall(u64::MAX), i64::MAX);

        let huge = AccountResourceSnapshot {
            energy_limit: u64::MAX,
            ..Default::default()
        };
        assert_eq!(huge.energy_shortfall(0), i64::MIN);
        assert_eq!(huge.energy_shortfall(u64::MAX), 0);
    }

    #[test]
    fn test_available_energy_scenario() {
        let snapshot = AccountResourceSnapshot {
            energy_limit: 40_000,
            energy_used: 20_000,
            ..Default::default()
        };
        assert_eq!(snapshot.available_energy(), 20_000);
        assert_eq!(snapshot.energy_shortfall(30_000), 10_000);
        assert_eq!(snapshot.energy_shortfall(5_000), -15_000);
    }

    #[test]
    fn test_available_bandwidth_sums_free_and_staked() {
        let snapshot = AccountResourceSnapshot {
            free_bandwidth_limit: 600,
            free_bandwidth_used: 100,
            staked_bandwidth_limit: 1_000,
            staked_bandwidth_used: 200,
            ..Default::default()
        };
        assert_eq!(snapshot.available_bandwidth(), 1_300);

        let drained = AccountResourceSnapshot {
            free_bandwidth_limit: 600,
            free_bandwidth_used: 700,
            ..Default::default()
        };
        assert_eq!(drained.available_bandwidth(), 0);
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(12_500_000, 6), "12.500000");
        assert_eq!(format_units(1, 6), "0.000001");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("12.5", 6), Ok(12_500_000));
        assert_eq!(parse_units("100", 6), Ok(100_000_000));
        assert_eq!(parse_units(".5", 6), Ok(500_000));
        assert!(parse_units("1.0000001", 6).is_err());
        assert!(parse_units("abc", 6).is_err());
        assert!(parse_units("", 6).is_err());
        assert!(parse_units("99999999999999999999", 6).is_err());
    }

    #[test]
    fn test_network_lookup() {
        let tron = NetworkId::Tron.network();
        assert_eq!(tron.symbol, "TRX");
        assert_eq!(tron.adapter, AdapterKind::Tron);
        assert_eq!(tron.coin_id, Some(195));

        for network in NETWORKS {
            assert_eq!(network.id.network().id, network.id);
        }
    }

    #[test]
    fn test_network_id_from_str() {
        assert_eq!("TRON".parse::<NetworkId>(), Ok(NetworkId::Tron));
        assert_eq!("bsc".parse::<NetworkId>(), Ok(NetworkId::Bnb));
        assert!("dogecoin".parse::<NetworkId>().is_err());
    }

    #[test]
    fn test_token_lookup() {
        let usdt = Token::lookup(NetworkId::Tron, "usdt").unwrap();
        assert_eq!(usdt.decimals, 6);
        assert!(Token::lookup(NetworkId::Ethereum, "USDT").is_none());
    }
}
