use std::collections::{HashMap, HashSet};

use crate::types::{Address, Block, Transaction};

/// Group a block's transactions by the subscribed addresses they touch.
///
/// Sender and recipient are checked independently, so a transaction between
/// two watched addresses lands in both groups. Groups come back in the order
/// their address was first touched, and each group keeps block order. Every
/// returned transaction is stamped with `block.height`.
pub fn match_block(block: &Block, watched: &HashSet<Address>) -> Vec<(Address, Vec<Transaction>)> {
    let mut groups = Groups::default();

    for tx in &block.transactions {
        if watched.contains(&tx.from) {
            groups.push(&tx.from, tx, block.height);
        }
        if let Some(to) = tx.to.as_deref().filter(|to| watched.contains(*to)) {
            groups.push(to, tx, block.height);
        }
    }

    groups.list
}

#[derive(Default)]
struct Groups<'a> {
    list: Vec<(Address, Vec<Transaction>)>,
    slot: HashMap<&'a str, usize>,
}

impl<'a> Groups<'a> {
    fn push(&mut self, addr: &'a str, tx: &Transaction, height: u64) {
        let list = &mut self.list;
        let i = *self.slot.entry(addr).or_insert_with(|| {
            list.push((addr.to_owned(), Vec::new()));
            list.len() - 1
        });
        list[i].1.push(tx.clone().at_height(height));
    }
}
