/// The last transaction redeemed by a user. One entry per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub user_id: String,
    pub last_transaction_id: String,
}
