//! Simulation scenarios.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use depositledger_common::AssetKind;

const SECONDS_PER_YEAR: u64 = depositledger_common::constants::SECONDS_PER_YEAR;

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
///
/// Users are referred to by label (`user1`, `owner`); amounts are decimal
/// strings in whole units of the asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Approve the ledger to pull tokens.
    Approve { user: String, amount: String },
    /// Deposit; native deposits attach exactly `amount`.
    Deposit {
        user: String,
        asset: AssetKind,
        amount: String,
    },
    /// Withdraw a fixed amount.
    Withdraw {
        user: String,
        asset: AssetKind,
        amount: String,
    },
    /// Withdraw the full effective balance.
    WithdrawAll { user: String, asset: AssetKind },
    /// Query custody as `caller`.
    ContractBalance { caller: String, asset: AssetKind },
    /// Move the ledger clock forward.
    AdvanceTime { seconds: u64 },
    /// Owner sends funds straight to custody to cover interest.
    FundReserve { asset: AssetKind, amount: String },
    /// Run `step` and require it to fail with `reason`.
    ExpectRejection {
        step: Box<ScenarioStep>,
        reason: String,
    },
    /// Require an effective balance.
    AssertBalance {
        user: String,
        asset: AssetKind,
        amount: String,
    },
    /// Require a custody total.
    AssertContractBalance { asset: AssetKind, amount: String },
}

fn s(value: &str) -> String {
    value.to_string()
}

impl Scenario {
    /// Names of the built-in scenarios.
    pub const BUILT_IN: [&'static str; 4] = [
        "interest-year",
        "token-cycle",
        "partial-withdrawal",
        "rejections",
    ];

    /// Load a built-in scenario by name, or a JSON scenario file.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "interest-year" => Ok(Self::interest_year()),
            "token-cycle" => Ok(Self::token_cycle()),
            "partial-withdrawal" => Ok(Self::partial_withdrawal()),
            "rejections" => Ok(Self::rejections()),
            path if path.ends_with(".json") => Self::from_file(Path::new(path)),
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Parse a JSON scenario file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading scenario {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Parsing scenario {}", path.display()))
    }

    /// Parse a JSON scenario.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// One native coin held for a year earns 5%.
    fn interest_year() -> Self {
        Self {
            name: s("interest-year"),
            description: s("Native deposit accrues one year of interest"),
            steps: vec![
                ScenarioStep::Deposit {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("1"),
                },
                ScenarioStep::AdvanceTime {
                    seconds: SECONDS_PER_YEAR,
                },
                ScenarioStep::AssertBalance {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("1.05"),
                },
                ScenarioStep::Withdraw {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("1"),
                },
                ScenarioStep::AssertBalance {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("0.05"),
                },
            ],
        }
    }

    /// Approve, deposit, accrue and withdraw the token principal.
    fn token_cycle() -> Self {
        Self {
            name: s("token-cycle"),
            description: s("Token deposit under allowance, one year, principal withdrawn"),
            steps: vec![
                ScenarioStep::Approve {
                    user: s("user1"),
                    amount: s("100"),
                },
                ScenarioStep::Deposit {
                    user: s("user1"),
                    asset: AssetKind::Token,
                    amount: s("100"),
                },
                ScenarioStep::AssertContractBalance {
                    asset: AssetKind::Token,
                    amount: s("100"),
                },
                ScenarioStep::AdvanceTime {
                    seconds: SECONDS_PER_YEAR,
                },
                ScenarioStep::AssertBalance {
                    user: s("user1"),
                    asset: AssetKind::Token,
                    amount: s("105"),
                },
                ScenarioStep::Withdraw {
                    user: s("user1"),
                    asset: AssetKind::Token,
                    amount: s("100"),
                },
                ScenarioStep::AssertContractBalance {
                    asset: AssetKind::Token,
                    amount: s("0"),
                },
            ],
        }
    }

    /// Partial withdrawal re-bases accrual; the reserve covers interest.
    fn partial_withdrawal() -> Self {
        Self {
            name: s("partial-withdrawal"),
            description: s("Partial withdrawal folds interest, reserve funds the final payout"),
            steps: vec![
                ScenarioStep::Deposit {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("10"),
                },
                ScenarioStep::AdvanceTime {
                    seconds: SECONDS_PER_YEAR,
                },
                ScenarioStep::Withdraw {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("0.5"),
                },
                ScenarioStep::AssertBalance {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("10"),
                },
                ScenarioStep::AdvanceTime {
                    seconds: SECONDS_PER_YEAR,
                },
                ScenarioStep::AssertBalance {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("10.5"),
                },
                ScenarioStep::ExpectRejection {
                    step: Box::new(ScenarioStep::WithdrawAll {
                        user: s("user1"),
                        asset: AssetKind::Native,
                    }),
                    reason: s("Transfer failed"),
                },
                ScenarioStep::FundReserve {
                    asset: AssetKind::Native,
                    amount: s("1"),
                },
                ScenarioStep::WithdrawAll {
                    user: s("user1"),
                    asset: AssetKind::Native,
                },
                ScenarioStep::AssertBalance {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("0"),
                },
            ],
        }
    }

    /// Every rejection path, each leaving state untouched.
    fn rejections() -> Self {
        Self {
            name: s("rejections"),
            description: s("Zero amounts, missing allowance, overdraw and non-owner queries"),
            steps: vec![
                ScenarioStep::ExpectRejection {
                    step: Box::new(ScenarioStep::Deposit {
                        user: s("user1"),
                        asset: AssetKind::Native,
                        amount: s("0"),
                    }),
                    reason: s("Amount should be greater than zero"),
                },
                ScenarioStep::ExpectRejection {
                    step: Box::new(ScenarioStep::Deposit {
                        user: s("user2"),
                        asset: AssetKind::Token,
                        amount: s("100"),
                    }),
                    reason: s("Transfer failed"),
                },
                ScenarioStep::AssertBalance {
                    user: s("user2"),
                    asset: AssetKind::Token,
                    amount: s("0"),
                },
                ScenarioStep::Deposit {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("1"),
                },
                ScenarioStep::ExpectRejection {
                    step: Box::new(ScenarioStep::Withdraw {
                        user: s("user1"),
                        asset: AssetKind::Native,
                        amount: s("2"),
                    }),
                    reason: s("Insufficient balance"),
                },
                ScenarioStep::AssertBalance {
                    user: s("user1"),
                    asset: AssetKind::Native,
                    amount: s("1"),
                },
                ScenarioStep::ExpectRejection {
                    step: Box::new(ScenarioStep::ContractBalance {
                        caller: s("user1"),
                        asset: AssetKind::Native,
                    }),
                    reason: s("Only owner can call this function"),
                },
                ScenarioStep::ContractBalance {
                    caller: s("owner"),
                    asset: AssetKind::Native,
                },
            ],
        }
    }
}
