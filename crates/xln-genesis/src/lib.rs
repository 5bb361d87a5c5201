//! Builds the founding `ReplayState` for a fresh deployment: the initial
//! entities, their signer quorums, and the bilateral accounts they open
//! with each other. Genesis writes account ledger lines directly rather
//! than through entity consensus — there is no prior frame for a genesis
//! account to reference (spec §4.1 "Account", §9).

pub mod error;
pub mod params;

pub use error::GenesisError;
pub use params::{GenesisAccountSpec, GenesisEntitySpec, GenesisParams};

use tracing::info;

use xln_account::{Account, TokenLine};
use xln_core::AccountKey;
use xln_entity::Entity;
use xln_replay::ReplayState;
use xln_state::StateDb;

/// Build the genesis `ReplayState` in memory, without touching storage.
pub fn build_genesis_state(params: &GenesisParams) -> Result<ReplayState, GenesisError> {
    let mut state = ReplayState::new();
    for spec in &params.entities {
        if state.entities.contains_key(&spec.id) {
            return Err(GenesisError::DuplicateEntity);
        }
        let mut entity = Entity::new(spec.id, spec.signers.clone(), spec.config.clone());
        for acc_spec in &spec.accounts {
            let key = AccountKey::new(spec.id, acc_spec.counterparty);
            let account = entity
                .accounts
                .entry(acc_spec.counterparty)
                .or_insert_with(|| Account::new(key));
            account.lines.insert(
                acc_spec.token_id,
                TokenLine {
                    collateral: acc_spec.collateral,
                    left_credit_limit: acc_spec.left_credit_limit,
                    right_credit_limit: acc_spec.right_credit_limit,
                    delta: 0,
                    last_jurisdiction_height: 0,
                },
            );
        }
        info!(entity = %spec.id, accounts = entity.accounts.len(), "genesis: entity seeded");
        state.entities.insert(spec.id, entity);
    }
    Ok(state)
}

/// Build genesis state and persist it to a fresh `StateDb`.
///
/// # Panics
/// Does not itself check the DB is empty — callers decide whether to
/// apply genesis based on `db.count_entities() == 0`, matching the
/// startup check a node binary performs before calling this.
pub fn apply_genesis(db: &StateDb, params: &GenesisParams) -> Result<ReplayState, GenesisError> {
    info!("applying genesis state");
    let state = build_genesis_state(params)?;
    db.save_replay_state(&state)?;
    db.flush()?;
    info!(entities = state.entities.len(), "genesis state committed to disk");
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xln_core::{Config, EntityId, SignerId};

    fn two_entity_params() -> GenesisParams {
        let a = EntityId([1u8; 32]);
        let b = EntityId([2u8; 32]);
        GenesisParams {
            entities: vec![
                GenesisEntitySpec {
                    id: a,
                    signers: vec![SignerId([1u8; 32])],
                    config: Config::default(),
                    accounts: vec![GenesisAccountSpec {
                        counterparty: b,
                        token_id: 1,
                        collateral: 1_000_000,
                        left_credit_limit: 0,
                        right_credit_limit: 0,
                    }],
                },
                GenesisEntitySpec {
                    id: b,
                    signers: vec![SignerId([2u8; 32])],
                    config: Config::default(),
                    accounts: vec![GenesisAccountSpec {
                        counterparty: a,
                        token_id: 1,
                        collateral: 1_000_000,
                        left_credit_limit: 0,
                        right_credit_limit: 0,
                    }],
                },
            ],
        }
    }

    #[test]
    fn genesis_seeds_mirrored_accounts_on_both_sides() {
        let params = two_entity_params();
        let state = build_genesis_state(&params).unwrap();
        let a = EntityId([1u8; 32]);
        let b = EntityId([2u8; 32]);
        assert_eq!(state.entities[&a].accounts[&b].lines[&1].collateral, 1_000_000);
        assert_eq!(state.entities[&b].accounts[&a].lines[&1].collateral, 1_000_000);
    }

    #[test]
    fn duplicate_entity_id_is_rejected() {
        let mut params = two_entity_params();
        let dup = params.entities[0].clone();
        params.entities.push(dup);
        let err = build_genesis_state(&params).unwrap_err();
        assert!(matches!(err, GenesisError::DuplicateEntity));
    }
}
