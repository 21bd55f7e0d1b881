//! Routes a classified event to the decode routine for its kind.

use chainactions_core::{Action, CandidateEvent, ClassifiedEvent, DispatchContext, DispatchError, EventKind};
use chainactions_evm::decode as evm;
use chainactions_solana::decode as solana;

#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher;

impl Dispatcher {
    /// Decode `event` into its action.
    ///
    /// The match has no wildcard arm: a new [`EventKind`] does not compile
    /// until it is routed here.
    pub fn dispatch(event: ClassifiedEvent, ctx: &DispatchContext) -> Result<Action, DispatchError> {
        let (kind, candidate) = event.into_parts();
        match (kind, &candidate) {
            (EventKind::Transfer, CandidateEvent::Evm(log)) => {
                Ok(Action::Transfer(evm::transfer(log, ctx)?))
            }
            (EventKind::MintFluid, CandidateEvent::Evm(log)) => Ok(Action::Mint(evm::mint(log, ctx)?)),
            (EventKind::BurnFluid, CandidateEvent::Evm(log)) => Ok(Action::Burn(evm::burn(log, ctx)?)),
            (EventKind::AccountUpdate, CandidateEvent::Solana(account)) => {
                Ok(Action::AccountUpdate(solana::account_update(account, ctx)?))
            }
            (EventKind::Transfer | EventKind::MintFluid | EventKind::BurnFluid, CandidateEvent::Solana(_))
            | (EventKind::AccountUpdate, CandidateEvent::Evm(_)) => Err(DispatchError::Invariant {
                kind,
                origin: candidate.origin(),
            }),
        }
    }
}
