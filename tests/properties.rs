//! Property tests: for arbitrary sequences of puts and erases, the table
//! must agree with `std::collections::HashMap` used as an oracle.

use std::collections::HashMap;

use cuckoo_table::Table;
use quickcheck_macros::quickcheck;

#[derive(Clone, Debug)]
enum Op {
    Put(u16, u32),
    Erase(u16),
}

impl quickcheck::Arbitrary for Op {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        if bool::arbitrary(g) {
            Op::Put(u16::arbitrary(g), u32::arbitrary(g))
        } else {
            Op::Erase(u16::arbitrary(g))
        }
    }
}

#[quickcheck]
fn put_and_erase_agree_with_hashmap_oracle(ops: Vec<Op>) -> bool {
    let mut table: Table<u16, u32> = Table::with_capacity(64, 4);
    let mut oracle: HashMap<u16, u32> = HashMap::new();

    for op in ops {
        match op {
            Op::Put(k, v) => {
                let inserted = table.put(k, v).is_inserted();
                let existed = oracle.insert(k, v).is_some();
                if inserted == existed {
                    return false;
                }
            }
            Op::Erase(k) => {
                if table.erase(&k).is_some() != oracle.remove(&k).is_some() {
                    return false;
                }
            }
        }
    }

    if table.len() != oracle.len() {
        return false;
    }
    oracle.iter().all(|(k, v)| table.get(k) == Some(v))
}

#[quickcheck]
fn len_matches_iteration_count(pairs: Vec<(u16, u32)>) -> bool {
    let mut table: Table<u16, u32> = Table::with_capacity(64, 4);
    for (k, v) in pairs {
        table.put(k, v);
    }
    table.len() == table.iter().count()
}

#[quickcheck]
fn put_is_idempotent(key: u16, value: u32) -> bool {
    let mut table: Table<u16, u32> = Table::with_capacity(64, 4);
    table.put(key, value);
    let len_after_first = table.len();
    table.put(key, value);
    table.len() == len_after_first && table.get(&key) == Some(&value)
}

#[quickcheck]
fn erase_after_put_restores_prior_state(key: u16, value: u32) -> bool {
    let mut table: Table<u16, u32> = Table::with_capacity(64, 4);
    let len_before = table.len();
    table.put(key, value);
    table.erase(&key);
    !table.contains_key(&key) && table.len() == len_before
}

#[quickcheck]
fn equality_law_holds(pairs: Vec<(u16, u32)>) -> bool {
    let mut a: Table<u16, u32> = Table::with_capacity(64, 4);
    let mut b: Table<u16, u32> = Table::with_capacity(64, 4);
    for (k, v) in &pairs {
        a.put(*k, *v);
        b.put(*k, *v);
    }
    a == b
}

#[quickcheck]
fn iteration_yields_each_live_pair_exactly_once(pairs: Vec<(u16, u32)>) -> bool {
    let mut table: Table<u16, u32> = Table::with_capacity(64, 4);
    let mut oracle: HashMap<u16, u32> = HashMap::new();
    for (k, v) in pairs {
        table.put(k, v);
        oracle.insert(k, v);
    }

    let mut seen: HashMap<u16, u32> = HashMap::new();
    for (k, v) in table.iter() {
        if seen.insert(*k, *v).is_some() {
            return false;
        }
    }
    seen == oracle
}
