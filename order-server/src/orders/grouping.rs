//! Active-order grouping for kitchen and floor views

use shared::models::Order;
use std::collections::HashMap;

/// Partition orders by table
///
/// Orders keep their input order inside a group. Groups come out in order of
/// first appearance, so an id-ordered input yields groups sorted by their
/// smallest order id.
pub fn group_by_table(orders: Vec<Order>) -> Vec<Vec<Order>> {
    let mut slots: HashMap<i64, usize> = HashMap::new();
    let mut groups: Vec<Vec<Order>> = Vec::new();

    for order in orders {
        let slot = *slots.entry(order.table_id).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(order);
    }

    groups
}
