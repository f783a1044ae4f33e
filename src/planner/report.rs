//! Human-readable plan report and wallet payment links
//!
//! The report is rendered from a finished [`TransferPlan`]; it carries no
//! information the plan itself does not.

use std::fmt;

use super::{AbortReason, PlanFlag, PlanOutcome, TransferPlan};
use crate::rental::RentalState;
use crate::types::{format_units, Address, Network, Token, TRX_DECIMALS};

const DEEP_LINK_BASE: &str = "https://link.trustwallet.com/send";
const EXPLORER_TX_URL: &str = "https://tronscan.io/#/transaction/";

/// Trust Wallet send link for `amount` smallest units of `token` (native coin when `None`)
///
/// Returns `None` for networks without a SLIP-44 coin id.
pub fn payment_link(
    network: &Network,
    token: Option<&Token>,
    address: &Address,
    amount: u64,
) -> Option<String> {
    let coin_id = network.coin_id?;
    let (asset, decimals) = match token {
        Some(token) => (format!("c{coin_id}_t{}", token.address), token.decimals),
        None => (format!("c{coin_id}"), network.decimals),
    };
    Some(format!(
        "{DEEP_LINK_BASE}?asset={asset}&address={address}&amount={}&memo=",
        display_amount(amount, decimals)
    ))
}

/// Decimal amount without trailing zeros ("12.5", "50")
fn display_amount(amount: u64, decimals: u8) -> String {
    let formatted = format_units(amount, decimals);
    if !formatted.contains('.') {
        return formatted;
    }
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn trx(sun: u64) -> String {
    format_units(sun, TRX_DECIMALS)
}

impl fmt::Display for TransferPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = &self.token.symbol;
        let decimals = self.token.decimals;

        writeln!(
            f,
            "Planning to send {} {symbol} from {} to {}",
            display_amount(self.amount, decimals),
            self.sender,
            self.recipient
        )?;

        let sender_balance = display_amount(self.sender_balance, decimals);
        if matches!(&self.outcome, PlanOutcome::Aborted { reason: AbortReason::InsufficientFunds { .. } }) {
            writeln!(f, "ERR Sender has not enough {symbol} to send (balance {sender_balance})")?;
            return writeln!(f, "ERR Aborted: {}", self.outcome_reason());
        }
        writeln!(f, "OK Sender has enough {symbol} to send (balance {sender_balance})")?;

        let token_balance = self.recipient_token_balance.unwrap_or(0);
        let native = match self.recipient_native_balance {
            Some(sun) => format!("{} TRX", trx(sun)),
            None => "not activated".to_string(),
        };
        let status = if token_balance > 0 || self.recipient_native_balance.unwrap_or(0) > 0 {
            "OK"
        } else {
            "WARN"
        };
        writeln!(
            f,
            "{status} Recipient balance: {} {symbol}, {native}",
            display_amount(token_balance, decimals)
        )?;

        if self.risky {
            writeln!(f, "WARN Tronscan marked recipient as risky: YES")?;
        }
        for flag in &self.flags {
            if let PlanFlag::HistoryUnavailable { reason } = flag {
                writeln!(f, "WARN Transfer history unavailable: {reason}")?;
            }
        }
        if !self.history.is_empty() {
            writeln!(f, "OK Found transaction history:")?;
            for entry in &self.history {
                writeln!(
                    f,
                    "\t{} days ago ({}) sent {} {symbol} {EXPLORER_TX_URL}{}",
                    entry.elapsed_days(),
                    entry.transfer.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    display_amount(entry.transfer.amount, decimals),
                    entry.transfer.transaction_id
                )?;
            }
        } else if self.has_flag(&PlanFlag::NoTransferHistory) {
            writeln!(f, "WARN No transactions found")?;
        }

        if let Some(estimate) = &self.estimate {
            writeln!(
                f,
                "Energy required: {}. Available: {}",
                estimate.energy_required, estimate.energy_available
            )?;
            if estimate.bandwidth_fee_estimated {
                writeln!(f, "Bandwidth required: unknown. Available: {}", estimate.bandwidth_available)?;
            } else {
                writeln!(
                    f,
                    "Bandwidth required: {}. Available: {}",
                    estimate.bandwidth_required, estimate.bandwidth_available
                )?;
            }
            if estimate.bandwidth_shortfall() {
                writeln!(f, "WARN Not enough bandwidth to send token")?;
            }
            writeln!(f, "Energy fee: {} TRX", trx(estimate.energy_fee))?;
            let note = if estimate.bandwidth_fee_estimated { " (default)" } else { "" };
            writeln!(f, "Bandwidth fee: {} TRX{note}", trx(estimate.bandwidth_fee))?;
            writeln!(f, "Total fee: {} TRX", trx(estimate.total_fee))?;
        }

        if let Some(rental) = &self.rental {
            if let Some(quote) = &rental.quote {
                writeln!(
                    f,
                    "Rental: {} energy for {} TRX ({})",
                    quote.energy,
                    trx(quote.price),
                    quote.period
                )?;
            }
            if let Some(order) = &rental.order {
                writeln!(f, "Rental order: {}", order.order_id)?;
            }
            if rental.state == RentalState::Fulfilled {
                writeln!(
                    f,
                    "OK Rented energy arrived after {}s ({} available)",
                    rental.waited.as_secs(),
                    rental.observed_energy
                )?;
            }
        }

        match &self.outcome {
            PlanOutcome::Go { payment_link } => {
                writeln!(f, "OK Sender has energy. Ready to send")?;
                if let Some(link) = payment_link {
                    writeln!(f, "> Open {} and send using {link}", self.sender)?;
                }
                Ok(())
            }
            PlanOutcome::DryRun => writeln!(f, "Dry run: no rental placed, nothing sent"),
            PlanOutcome::Aborted { .. } => writeln!(f, "ERR Aborted: {}", self.outcome_reason()),
        }
    }
}

impl TransferPlan {
    fn outcome_reason(&self) -> String {
        self.outcome
            .abort_reason()
            .map(|r| r.to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NetworkId;

    #[test]
    fn test_display_amount_trims_zeros() {
        assert_eq!(display_amount(12_500_000, 6), "12.5");
        assert_eq!(display_amount(50_000_000, 6), "50");
        assert_eq!(display_amount(1, 6), "0.000001");
        assert_eq!(display_amount(7, 0), "7");
    }

    #[test]
    fn test_payment_link_for_trc20_token() {
        let token = Token::tron_usdt();
        let link = payment_link(
            NetworkId::Tron.network(),
            Some(&token),
            &Address::from("TA9pkx4DFxrEw8JZzUtyDrh2uAat1LDuJL"),
            12_500_000,
        )
        .unwrap();
        assert_eq!(
            link,
            "https://link.trustwallet.com/send?asset=c195_tTR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t\
             &address=TA9pkx4DFxrEw8JZzUtyDrh2uAat1LDuJL&amount=12.5&memo="
        );
    }

    #[test]
    fn test_payment_link_for_native_coin() {
        let link = payment_link(
            NetworkId::Tron.network(),
            None,
            &Address::from("TA9pkx4DFxrEw8JZzUtyDrh2uAat1LDuJL"),
            2_850_000,
        )
        .unwrap();
        assert!(link.contains("asset=c195&"));
        assert!(link.contains("amount=2.85&"));
    }

    #[test]
    fn test_payment_link_requires_coin_id() {
        let link = payment_link(
            NetworkId::Bnb.network(),
            None,
            &Address::from("0xabc"),
            1,
        );
        assert!(link.is_none());
    }
}
