//! Simulation controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use depositledger_common::constants::SECONDS_PER_DAY;
use depositledger_common::{
    format_units, parse_units, Address, Amount, AssetKind, Clock, LedgerError, ManualClock,
    Timestamp, NATIVE_DECIMALS,
};
use depositledger_ledger::{
    DepositLedger, InMemoryBalanceStore, InMemoryCustody, LedgerConfig, SolvencyReport,
};

use crate::metrics::{OperationKind, SimulationMetrics};
use crate::scenario::{Scenario, ScenarioStep};
use crate::users::{SimulatedUser, UserFactory};

/// Ledger wired to in-memory custody and a manual clock.
pub type SimLedger = DepositLedger<InMemoryBalanceStore, InMemoryCustody, ManualClock>;

/// Decimals of the simulated token.
pub const TOKEN_DECIMALS: u32 = 18;

/// Native coin and tokens each simulated user starts with.
const USER_ALLOCATION: &str = "1000";

/// Native coin and tokens the owner holds for interest reserves.
const OWNER_RESERVE: &str = "10000";

/// Longest clock jump between random operations.
const MAX_ADVANCE_SECS: u64 = 30 * SECONDS_PER_DAY;

fn decimals(asset: AssetKind) -> u32 {
    match asset {
        AssetKind::Native => NATIVE_DECIMALS,
        AssetKind::Token => TOKEN_DECIMALS,
    }
}

fn parse_amount(text: &str, asset: AssetKind) -> anyhow::Result<Amount> {
    Ok(parse_units(text, decimals(asset))?)
}

/// Render an amount of `asset` for humans.
pub fn display_amount(amount: Amount, asset: AssetKind) -> String {
    format_units(amount, decimals(asset))
}

/// End-of-run summary for one asset.
#[derive(Debug, Clone)]
pub struct AssetReport {
    /// Custody against liabilities.
    pub solvency: SolvencyReport,
    /// Interest folded into records so far.
    pub interest_folded: Amount,
    /// Committed deposits minus withdrawals.
    pub net_inflow: i128,
}

/// Controls the simulation.
pub struct SimulationController {
    /// Number of users.
    user_count: usize,
    /// Operations per second per user in continuous mode.
    speed: f64,
    /// Ledger owner.
    owner: Address,
    /// Clock shared with the ledger.
    clock: ManualClock,
    /// Random number generator.
    rng: Arc<Mutex<StdRng>>,
    /// The ledger; the mutex makes it a single writer.
    ledger: Arc<Mutex<SimLedger>>,
    /// Simulated users.
    users: Arc<Vec<SimulatedUser>>,
    /// Simulation metrics.
    metrics: Arc<Mutex<SimulationMetrics>>,
    /// Running flag.
    running: Arc<AtomicBool>,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(
        config: &LedgerConfig,
        user_count: usize,
        speed: f64,
        seed: Option<u64>,
    ) -> anyhow::Result<Self> {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let owner = Address::derive("owner");
        let clock = ManualClock::starting_now();
        let custody = InMemoryCustody::new(Address::derive("DefiDeposit"), config.token_address);
        let ledger = DepositLedger::new(
            owner,
            config,
            InMemoryBalanceStore::new(),
            custody,
            clock.clone(),
        )?;

        Ok(Self {
            user_count,
            speed,
            owner,
            clock,
            rng: Arc::new(Mutex::new(rng)),
            ledger: Arc::new(Mutex::new(ledger)),
            users: Arc::new(Vec::new()),
            metrics: Arc::new(Mutex::new(SimulationMetrics::new())),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Create users and hand out starting balances.
    pub fn initialize(&mut self) -> anyhow::Result<()> {
        info!("Initializing simulation with {} users", self.user_count);

        let users = UserFactory::create_users(self.user_count);
        let allocation = parse_units(USER_ALLOCATION, NATIVE_DECIMALS)?;
        let reserve = parse_units(OWNER_RESERVE, NATIVE_DECIMALS)?;

        {
            let mut ledger = self.ledger.lock();
            let custody = ledger.adapter_mut();

            custody.fund_native(self.owner, reserve)?;
            custody.token_mut().mint(self.owner, reserve)?;

            for user in &users {
                custody.fund_native(user.address, allocation)?;
                custody.token_mut().mint(user.address, allocation)?;
                info!(
                    user = %user.label,
                    address = %user.address,
                    "Funded user with {} native and {} tokens",
                    USER_ALLOCATION,
                    USER_ALLOCATION
                );
            }
        }

        self.users = Arc::new(users);
        Ok(())
    }

    /// Run a scenario, stopping at the first failed assertion.
    pub fn run_scenario(&self, scenario: &Scenario) -> anyhow::Result<()> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        for (index, step) in scenario.steps.iter().enumerate() {
            self.execute_step(step)
                .map_err(|e| anyhow!("Step {} ({:?}) failed: {}", index + 1, step, e))?;
        }

        info!("Scenario {} passed", scenario.name);
        Ok(())
    }

    /// Run random operations until `duration` elapses or Ctrl+C.
    pub async fn run(&self, duration: Option<Duration>) -> anyhow::Result<()> {
        info!("Running simulation in continuous mode");

        self.running.store(true, Ordering::SeqCst);

        let delay = Duration::from_secs_f64(1.0 / self.speed.max(0.001));
        let handles: Vec<_> = self
            .users
            .iter()
            .cloned()
            .map(|user| {
                let worker = Worker {
                    user,
                    clock: self.clock.clone(),
                    rng: self.rng.clone(),
                    ledger: self.ledger.clone(),
                    metrics: self.metrics.clone(),
                };
                let running = self.running.clone();
                tokio::spawn(async move {
                    while running.load(Ordering::SeqCst) {
                        worker.random_operation();
                        tokio::time::sleep(delay).await;
                    }
                })
            })
            .collect();

        // Wait for duration or Ctrl+C
        match duration {
            Some(d) => {
                tokio::time::sleep(d).await;
            }
            None => {
                tokio::signal::ctrl_c().await?;
            }
        }

        self.stop();
        for result in futures::future::join_all(handles).await {
            result?;
        }

        Ok(())
    }

    /// Stop the simulation.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Get simulation metrics.
    pub fn get_metrics(&self) -> SimulationMetrics {
        self.metrics.lock().clone()
    }

    /// Per-asset summary, queried as the owner.
    pub fn report(&self) -> anyhow::Result<Vec<AssetReport>> {
        let ledger = self.ledger.lock();
        AssetKind::ALL
            .into_iter()
            .map(|asset| {
                Ok(AssetReport {
                    solvency: ledger.solvency(self.owner, asset)?,
                    interest_folded: ledger.journal().total_interest(asset),
                    net_inflow: ledger.journal().net_inflow(asset),
                })
            })
            .collect()
    }

    /// Current time on the ledger's clock.
    pub fn ledger_time(&self) -> Timestamp {
        self.ledger.lock().clock().now()
    }

    /// Balance store snapshot as JSON.
    pub fn dump_state(&self) -> anyhow::Result<String> {
        Ok(self.ledger.lock().store().to_json()?)
    }

    fn resolve(&self, label: &str) -> anyhow::Result<Address> {
        if label == "owner" {
            return Ok(self.owner);
        }
        self.users
            .iter()
            .find(|u| u.label == label)
            .map(|u| u.address)
            .ok_or_else(|| anyhow!("Unknown user: {}", label))
    }

    /// Execute a single scenario step.
    fn execute_step(&self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::AdvanceTime { seconds } => {
                let now = self.clock.advance(*seconds);
                info!(seconds, now, "Advanced ledger clock");
            }
            ScenarioStep::Approve { user, amount } => {
                let address = self.resolve(user)?;
                let amount = parse_amount(amount, AssetKind::Token)?;
                self.ledger.lock().adapter_mut().approve_ledger(address, amount);
                info!(user = %user, amount = %display_amount(amount, AssetKind::Token), "Approved ledger");
            }
            ScenarioStep::FundReserve { asset, amount } => {
                let amount = parse_amount(amount, *asset)?;
                let mut ledger = self.ledger.lock();
                let custody = ledger.adapter_mut();
                let vault = custody.custody_address();
                match asset {
                    AssetKind::Native => custody.send_native_to_custody(&self.owner, amount)?,
                    AssetKind::Token => custody.token_mut().transfer(&self.owner, &vault, amount)?,
                }
                info!(asset = %asset, amount = %display_amount(amount, *asset), "Reserve funded");
            }
            ScenarioStep::ExpectRejection { step, reason } => match self.apply(step)? {
                Ok(_) => bail!("expected rejection \"{}\" but the step succeeded", reason),
                Err(e) if e.to_string() == *reason => {
                    info!(reason = %reason, code = e.error_code(), "Rejected as expected");
                }
                Err(e) => bail!("expected rejection \"{}\", got \"{}\"", reason, e),
            },
            ScenarioStep::AssertBalance {
                user,
                asset,
                amount,
            } => {
                let address = self.resolve(user)?;
                let expected = parse_amount(amount, *asset)?;
                let actual = self.ledger.lock().get_balance(address, *asset)?;
                if actual != expected {
                    bail!(
                        "{} {} balance is {}, expected {}",
                        user,
                        asset,
                        display_amount(actual, *asset),
                        amount
                    );
                }
            }
            ScenarioStep::AssertContractBalance { asset, amount } => {
                let expected = parse_amount(amount, *asset)?;
                let actual = self.ledger.lock().get_contract_balance(self.owner, *asset)?;
                if actual != expected {
                    bail!(
                        "{} custody is {}, expected {}",
                        asset,
                        display_amount(actual, *asset),
                        amount
                    );
                }
            }
            operation => {
                if let Err(e) = self.apply(operation)? {
                    warn!(error = %e, code = e.error_code(), "Operation rejected");
                }
            }
        }

        Ok(())
    }

    /// Run a ledger operation step and record its outcome.
    ///
    /// The outer error is a malformed step; the inner one is the ledger's
    /// verdict.
    fn apply(&self, step: &ScenarioStep) -> anyhow::Result<Result<Amount, LedgerError>> {
        let (kind, asset, result) = match step {
            ScenarioStep::Deposit {
                user,
                asset,
                amount,
            } => {
                let address = self.resolve(user)?;
                let amount = parse_amount(amount, *asset)?;
                let attached = match asset {
                    AssetKind::Native => amount,
                    AssetKind::Token => 0,
                };
                let result = self
                    .ledger
                    .lock()
                    .deposit(address, amount, *asset, attached)
                    .map(|_| amount);
                (OperationKind::Deposit, *asset, result)
            }
            ScenarioStep::Withdraw {
                user,
                asset,
                amount,
            } => {
                let address = self.resolve(user)?;
                let amount = parse_amount(amount, *asset)?;
                let result = self
                    .ledger
                    .lock()
                    .withdraw(address, amount, *asset)
                    .map(|_| amount);
                (OperationKind::Withdrawal, *asset, result)
            }
            ScenarioStep::WithdrawAll { user, asset } => {
                let address = self.resolve(user)?;
                let mut ledger = self.ledger.lock();
                let result = ledger.get_balance(address, *asset).and_then(|balance| {
                    ledger.withdraw(address, balance, *asset).map(|_| balance)
                });
                (OperationKind::Withdrawal, *asset, result)
            }
            ScenarioStep::ContractBalance { caller, asset } => {
                let address = self.resolve(caller)?;
                let result = self.ledger.lock().get_contract_balance(address, *asset);
                (OperationKind::Query, *asset, result)
            }
            other => bail!("not a ledger operation: {:?}", other),
        };

        let mut metrics = self.metrics.lock();
        match &result {
            Ok(amount) => metrics.record_success(kind, asset, *amount),
            Err(e) => metrics.record_rejection(e),
        }

        Ok(result)
    }
}

/// One user's random workload in continuous mode.
struct Worker {
    user: SimulatedUser,
    clock: ManualClock,
    rng: Arc<Mutex<StdRng>>,
    ledger: Arc<Mutex<SimLedger>>,
    metrics: Arc<Mutex<SimulationMetrics>>,
}

impl Worker {
    fn random_operation(&self) {
        let (choice, asset, per_mille, advance) = {
            let mut rng = self.rng.lock();
            let asset = if rng.gen_bool(0.5) {
                AssetKind::Native
            } else {
                AssetKind::Token
            };
            (
                rng.gen_range(0..10u8),
                asset,
                rng.gen_range(0..=1_000u128),
                rng.gen_range(0..MAX_ADVANCE_SECS),
            )
        };

        self.clock.advance(advance);
        let address = self.user.address;

        let (kind, result) = {
            let mut ledger = self.ledger.lock();
            match choice {
                0..=5 => {
                    // Up to 10% of the wallet.
                    let wallet = match asset {
                        AssetKind::Native => ledger.adapter().native_balance(&address),
                        AssetKind::Token => ledger.adapter().token().balance_of(&address),
                    };
                    let amount = wallet / 10_000 * per_mille;
                    let attached = match asset {
                        AssetKind::Native => amount,
                        AssetKind::Token => {
                            ledger.adapter_mut().approve_ledger(address, amount);
                            0
                        }
                    };
                    let result = ledger
                        .deposit(address, amount, asset, attached)
                        .map(|_| amount);
                    (OperationKind::Deposit, result)
                }
                6..=8 => {
                    let result = ledger.get_balance(address, asset).and_then(|balance| {
                        let amount = balance / 1_000 * per_mille;
                        ledger.withdraw(address, amount, asset).map(|_| amount)
                    });
                    (OperationKind::Withdrawal, result)
                }
                _ => (
                    OperationKind::Query,
                    ledger.get_contract_balance(address, asset),
                ),
            }
        };

        let mut metrics = self.metrics.lock();
        match &result {
            Ok(amount) => metrics.record_success(kind, asset, *amount),
            Err(e) => {
                warn!(user = %self.user.label, error = %e, "Operation rejected");
                metrics.record_rejection(e);
            }
        }
    }
}
