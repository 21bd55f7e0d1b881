//! Solana account source: program notifications become candidates 1:1.

use crate::error::SubscriptionError;
use crate::subscription::NotificationReceiver;
use crate::wire::{AccountData, AccountNotification, JSON_PARSED};
use chainactions_core::{AccountCandidate, AccountState, CandidateEvent, CandidateStream, EventSource};
use futures::{future, stream, StreamExt};

#[derive(Debug, Clone, Copy, Default)]
pub struct SolanaAccountSource;

impl SolanaAccountSource {
    pub fn new() -> Self {
        Self
    }

    /// Adapt a subscription's receiver into a candidate stream.
    pub fn candidates(self, notifications: NotificationReceiver) -> CandidateStream<SubscriptionError> {
        let items = stream::unfold(notifications, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Box::pin(items.filter_map(move |item| {
            future::ready(match item {
                Ok(notification) => self.normalize(notification).map(Ok),
                Err(e) => Some(Err(e)),
            })
        }))
    }
}

impl EventSource for SolanaAccountSource {
    type Raw = AccountNotification;

    fn name(&self) -> &'static str {
        "solana"
    }

    fn normalize(&self, notification: AccountNotification) -> Option<CandidateEvent> {
        let AccountNotification {
            result,
            subscription,
        } = notification;
        let account = result.value.account;
        // Parsed data is carried as JSON text; decoding rejects it per item.
        let (data, encoding) = match account.data {
            AccountData::Encoded(data, encoding) => (data, encoding),
            AccountData::Parsed(value) => (value.to_string(), JSON_PARSED.to_string()),
        };

        Some(CandidateEvent::Solana(AccountCandidate {
            slot: result.context.slot,
            pubkey: result.value.pubkey,
            subscription,
            account: AccountState {
                lamports: account.lamports,
                data,
                encoding,
                owner: account.owner,
                executable: account.executable,
                rent_epoch: account.rent_epoch,
            },
        }))
    }
}
