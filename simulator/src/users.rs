//! Simulated depositors.

use depositledger_common::Address;

/// A simulated depositor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedUser {
    /// Label used in scenarios, e.g. `user1`.
    pub label: String,
    /// Derived identity.
    pub address: Address,
}

impl SimulatedUser {
    /// Create a user whose address is derived from `label`.
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            address: Address::derive(&label),
            label,
        }
    }
}

/// Factory for creating simulated users.
pub struct UserFactory;

impl UserFactory {
    /// Create `count` users labelled `user1..=userN`.
    pub fn create_users(count: usize) -> Vec<SimulatedUser> {
        (1..=count)
            .map(|i| SimulatedUser::new(format!("user{i}")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_users() {
        let users = UserFactory::create_users(3);
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].label, "user1");
        assert_eq!(users[2].address, Address::derive("user3"));
    }
}
