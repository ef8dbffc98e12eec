use crate::error::Result;
use crate::intern::TypeIntern;
use crate::stats::Stats;
use ark_binary::{decode_envelope, encode_envelope, Decoder, Encoder};
use ark_matcher::Matcher;
use ark_types::{Item, TypeCode, MSO};
use std::rc::Rc;

/// One MSO-keyed slot: present (interned) or absent for this record.
pub type Slot = Option<Rc<Item>>;

/// One node of the prefix-compressed summary trie (spec §4.7): a run of
/// MSO slots shared by every record under it, the rolled-up [`Stats`] for
/// that whole subtree, and its children.
///
/// A leaf (`children` empty) always has its own full MSO tuple expressed
/// across the path from the root, prefix ownership included: the subtree
/// rooted here describes exactly the records sharing that tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    prefix: Vec<Slot>,
    stats: Stats,
    children: Vec<Node>,
}

impl Node {
    pub fn empty() -> Node {
        Node {
            prefix: Vec::new(),
            stats: Stats::empty(),
            children: Vec::new(),
        }
    }

    fn leaf(prefix: Vec<Slot>, stats: Stats) -> Node {
        Node {
            prefix,
            stats,
            children: Vec::new(),
        }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    fn common_len(&self, items: &[Slot]) -> usize {
        self.prefix.iter().zip(items.iter()).take_while(|(a, b)| a == b).count()
    }

    /// Cuts `self.prefix` at `pos`, pushing the removed tail (plus every
    /// existing child) down into one new child that inherits a copy of
    /// `self`'s pre-split stats (node.cc `Node::split`).
    fn split(&mut self, pos: usize) {
        let tail = self.prefix.split_off(pos);
        let moved_children = std::mem::take(&mut self.children);
        let child = Node {
            prefix: tail,
            stats: self.stats.clone(),
            children: moved_children,
        };
        self.children = vec![child];
    }

    /// The child whose own prefix begins the same way `items` does — the
    /// node an `items` insertion would continue merging into, if any
    /// (node.cc `Node::candidate_for_merge`).
    fn candidate_for_merge(&self, items: &[Slot]) -> Option<usize> {
        match items.first() {
            None => self.children.iter().position(|c| c.prefix.is_empty()),
            Some(first) => self
                .children
                .iter()
                .position(|c| c.prefix.first().map(|s| s == first).unwrap_or(false)),
        }
    }

    /// Merges one record's (already rtrimmed) MSO tuple and its singleton
    /// stats into this subtree (spec §4.7 `add`, node.cc `Node::merge`).
    fn merge(&mut self, items: &[Slot], stats: &Stats) {
        let common = self.common_len(items);
        if common < self.prefix.len() {
            self.split(common);
        }
        let remaining = &items[common..];
        self.stats.merge(stats);
        if remaining.is_empty() && self.children.is_empty() {
            return;
        }
        match self.candidate_for_merge(remaining) {
            Some(idx) => self.children[idx].merge(remaining, stats),
            None => self.children.push(Node::leaf(remaining.to_vec(), stats.clone())),
        }
    }

    /// Merges one record's tuple into the tree rooted here.
    pub fn merge_record(&mut self, items: &[Slot], stats: &Stats) {
        self.merge(items, stats);
    }

    /// Depth-first traversal (node.cc `Node::visit`/`visitFiltered`):
    /// `current` accumulates the full MSO tuple along the current path, and
    /// `callback` runs once per leaf whose ancestry survives `filter`.
    /// Returns `false` only when `callback` itself asked to stop; pruning a
    /// subtree on a filter mismatch is not an abort.
    fn visit(
        &self,
        depth: usize,
        current: &mut Vec<Slot>,
        filter: Option<&Matcher>,
        callback: &mut dyn FnMut(&[Slot], &Stats) -> bool,
    ) -> bool {
        if let Some(matcher) = filter {
            for (i, slot) in self.prefix.iter().enumerate() {
                let code = MSO[depth + i];
                if let Some(or) = matcher.clause(code) {
                    let matched = slot.as_ref().map(|item| or.matches_item(item)).unwrap_or(false);
                    if !matched {
                        return true;
                    }
                }
            }
            if let Some(or) = matcher.clause(TypeCode::Reftime) {
                match self.stats.envelope_reftime() {
                    Some(rt) if or.matches_item(&Item::Reftime(rt)) => {}
                    _ => return true,
                }
            }
        }

        let bound = depth + self.prefix.len();
        while current.len() < bound {
            current.push(None);
        }
        current[depth..bound].clone_from_slice(&self.prefix);

        if self.children.is_empty() {
            return callback(&current[..bound], &self.stats);
        }

        for child in &self.children {
            if !child.visit(bound, current, filter, callback) {
                return false;
            }
        }
        true
    }

    /// Entry point for a traversal of this subtree.
    pub fn visit_all<F: FnMut(&[Slot], &Stats) -> bool>(&self, filter: Option<&Matcher>, mut callback: F) -> bool {
        self.visit(0, &mut Vec::new(), filter, &mut callback)
    }

    /// Writes this node as `varint(len) · md envelopes · stats · varint(n_children) · children`.
    pub fn encode_into(&self, enc: &mut Encoder, depth: usize) {
        enc.put_varint_usize(self.prefix.len());
        for (i, slot) in self.prefix.iter().enumerate() {
            let code = MSO[depth + i];
            match slot {
                Some(item) => item.encode(enc),
                None => encode_envelope(enc, code.wire_code(), &[]),
            }
        }
        self.stats.encode(enc);
        enc.put_varint_usize(self.children.len());
        let child_depth = depth + self.prefix.len();
        for child in &self.children {
            child.encode_into(enc, child_depth);
        }
    }

    pub fn decode_from(dec: &mut Decoder, intern: &TypeIntern) -> Result<Node> {
        let len = dec.take_varint_usize("summary node prefix length")?;
        let mut prefix = Vec::with_capacity(len);
        for _ in 0..len {
            let (code, body) = decode_envelope(dec)?;
            if body.is_empty() {
                prefix.push(None);
            } else {
                let code = TypeCode::from_wire_code(code)?;
                let mut idec = Decoder::new(body);
                let item = Item::decode_payload(code, &mut idec)?;
                prefix.push(Some(intern.intern(item)));
            }
        }
        let stats = Stats::decode(dec)?;
        let n_children = dec.take_varint_usize("summary node children count")?;
        let mut children = Vec::with_capacity(n_children);
        for _ in 0..n_children {
            children.push(Node::decode_from(dec, intern)?);
        }
        Ok(Node { prefix, stats, children })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_types::types::{Level, Origin};

    fn mso_vec(origin: Option<Origin>, level: Option<Level>) -> Vec<Slot> {
        let intern = TypeIntern::new();
        let mut v: Vec<Slot> = vec![None; MSO.len()];
        if let Some(o) = origin {
            v[MSO.iter().position(|&c| c == TypeCode::Origin).unwrap()] = Some(intern.intern(Item::Origin(o)));
        }
        if let Some(l) = level {
            v[MSO.iter().position(|&c| c == TypeCode::Level).unwrap()] = Some(intern.intern(Item::Level(l)));
        }
        while v.last().map(|s| s.is_none()).unwrap_or(false) {
            v.pop();
        }
        v
    }

    #[test]
    fn merge_two_identical_records_keeps_one_leaf() {
        let mut root = Node::empty();
        let v = mso_vec(
            Some(Origin::Grib1 {
                centre: 1,
                subcentre: 0,
                process: 0,
            }),
            None,
        );
        root.merge_record(&v, &Stats::singleton(10, None));
        root.merge_record(&v, &Stats::singleton(20, None));
        assert_eq!(root.children.len(), 1);
        assert!(root.children[0].children.is_empty());
        assert_eq!(root.children[0].stats.count, 2);
        assert_eq!(root.stats.count, 2);
    }

    #[test]
    fn merge_diverging_records_splits_common_prefix() {
        let mut root = Node::empty();
        let a = mso_vec(
            Some(Origin::Grib1 {
                centre: 1,
                subcentre: 0,
                process: 0,
            }),
            Some(Level::Grib1 { ltype: 1, l1: 1, l2: 0 }),
        );
        let b = mso_vec(
            Some(Origin::Grib1 {
                centre: 1,
                subcentre: 0,
                process: 0,
            }),
            Some(Level::Grib1 { ltype: 2, l1: 2, l2: 0 }),
        );
        root.merge_record(&a, &Stats::singleton(1, None));
        root.merge_record(&b, &Stats::singleton(1, None));

        assert_eq!(root.children.len(), 1);
        let origin_node = &root.children[0];
        assert_eq!(origin_node.prefix.len(), 1);
        assert_eq!(origin_node.children.len(), 2);
        assert_eq!(origin_node.stats.count, 2);
    }

    #[test]
    fn visit_emits_full_tuple_per_leaf() {
        let mut root = Node::empty();
        let v = mso_vec(
            Some(Origin::Grib1 {
                centre: 1,
                subcentre: 0,
                process: 0,
            }),
            Some(Level::Grib1 { ltype: 1, l1: 1, l2: 0 }),
        );
        root.merge_record(&v, &Stats::singleton(5, None));

        let mut seen = Vec::new();
        root.visit_all(None, |tuple, stats| {
            seen.push((tuple.to_vec(), stats.count));
            true
        });
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, 1);
        assert_eq!(seen[0].0.len(), MSO.iter().position(|&c| c == TypeCode::Level).unwrap() + 1);
    }

    #[test]
    fn visit_can_abort_early() {
        let mut root = Node::empty();
        root.merge_record(
            &mso_vec(
                Some(Origin::Grib1 {
                    centre: 1,
                    subcentre: 0,
                    process: 0,
                }),
                None,
            ),
            &Stats::singleton(1, None),
        );
        root.merge_record(
            &mso_vec(
                Some(Origin::Grib1 {
                    centre: 2,
                    subcentre: 0,
                    process: 0,
                }),
                None,
            ),
            &Stats::singleton(1, None),
        );

        let mut count = 0;
        let completed = root.visit_all(None, |_, _| {
            count += 1;
            false
        });
        assert_eq!(count, 1);
        assert!(!completed);
    }

    #[test]
    fn binary_round_trips() {
        let mut root = Node::empty();
        root.merge_record(
            &mso_vec(
                Some(Origin::Grib1 {
                    centre: 1,
                    subcentre: 2,
                    process: 3,
                }),
                Some(Level::Grib1 { ltype: 1, l1: 1, l2: 0 }),
            ),
            &Stats::singleton(100, None),
        );

        let mut enc = Encoder::new();
        root.encode_into(&mut enc, 0);
        let bytes = enc.into_vec();

        let intern = TypeIntern::new();
        let mut dec = Decoder::new(&bytes);
        let back = Node::decode_from(&mut dec, &intern).unwrap();
        assert_eq!(back, root);
    }
}
