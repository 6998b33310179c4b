//! Posting lists and their lazy iterators.
//!
//! The postings of one token occupy a contiguous range of the posting stream, starting
//! at the token's posting pointer:
//!
//! ```text
//! [pre: u32] x size, then for each posting in the same order: [count: u32][position: u32] x count
//! ```
//!
//! A [`PostingStream`] decodes such a range on demand. Results of several tokens are
//! combined with [`union`] / [`union_all`] into a single ascending sequence.

use std::{cmp::Ordering, vec};

use fttrie_common::{Result, error::Error, try_or_ret_some_err};
use fttrie_io::Segment;

use crate::read::TermEntry;

/// Number of pre-values fetched per positioned read.
const PRE_BATCH: u32 = 64;

/// Occurrences of a token within one document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Pre-order value of the document node.
    pub pre: u32,
    /// Strictly ascending token positions inside the node. Empty in fast mode.
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(pre: u32, positions: Vec<u32>) -> Posting {
        Posting { pre, positions }
    }

    /// Folds `other`'s positions into this posting as a sorted set union.
    ///
    /// Both postings must refer to the same pre-value.
    pub fn merge(&mut self, other: Posting) {
        debug_assert_eq!(self.pre, other.pre);
        if other.positions.is_empty() {
            return;
        }
        if self.positions.is_empty() {
            self.positions = other.positions;
            return;
        }
        let (a, b) = (&self.positions, &other.positions);
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    merged.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    merged.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        self.positions = merged;
    }
}

/// Lazy decoder of the postings of a single token.
#[derive(Debug)]
pub struct PostingStream {
    segment: Segment,
    /// Offset of the next unread pre-value.
    pre_offset: u64,
    /// Offset of the next unread position list.
    position_offset: u64,
    /// Postings not yet yielded.
    remaining: u32,
    /// Pre-values read ahead but not yet yielded.
    pres: vec::IntoIter<u32>,
    last_pre: Option<u32>,
    fast: bool,
}

impl PostingStream {
    /// Creates a stream over `size` postings at `pointer`.
    ///
    /// In `fast` mode only the pre-values are read and every posting has an empty
    /// position list.
    pub fn new(segment: Segment, pointer: u64, size: u32, fast: bool) -> PostingStream {
        PostingStream {
            segment,
            pre_offset: pointer,
            position_offset: pointer + size as u64 * 4,
            remaining: size,
            pres: Vec::new().into_iter(),
            last_pre: None,
            fast,
        }
    }

    pub fn for_term(segment: Segment, term: &TermEntry, fast: bool) -> PostingStream {
        Self::new(segment, term.posting_pointer, term.posting_size, fast)
    }

    fn next_pre(&mut self) -> Result<u32> {
        if let Some(pre) = self.pres.next() {
            return Ok(pre);
        }
        let batch = self.remaining.min(PRE_BATCH);
        let pres = self.segment.read_u32_vec(self.pre_offset, batch as usize)?;
        self.pre_offset += batch as u64 * 4;
        self.pres = pres.into_iter();
        self.pres
            .next()
            .ok_or_else(|| Error::corrupted(self.segment.name(), "empty pre-value batch"))
    }

    fn read_posting(&mut self) -> Result<Posting> {
        let pre = self.next_pre()?;
        if self.last_pre.is_some_and(|last| pre <= last) {
            return Err(Error::corrupted(
                self.segment.name(),
                format!("pre-value {pre} out of order after {:?}", self.last_pre),
            ));
        }
        self.last_pre = Some(pre);
        if self.fast {
            return Ok(Posting::new(pre, Vec::new()));
        }

        let count = self.segment.read_u32(self.position_offset)?;
        if count == 0 {
            return Err(Error::corrupted(
                self.segment.name(),
                format!("empty position list for pre-value {pre}"),
            ));
        }
        let positions = self
            .segment
            .read_u32_vec(self.position_offset + 4, count as usize)?;
        self.position_offset += 4 + count as u64 * 4;
        if positions.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::corrupted(
                self.segment.name(),
                format!("positions of pre-value {pre} are not strictly ascending"),
            ));
        }
        Ok(Posting::new(pre, positions))
    }
}

impl Iterator for PostingStream {
    type Item = Result<Posting>;

    fn next(&mut self) -> Option<Result<Posting>> {
        if self.remaining == 0 {
            return None;
        }
        match self.read_posting() {
            Ok(posting) => {
                self.remaining -= 1;
                Some(Ok(posting))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// Sorted merge of two posting iterators.
///
/// Postings sharing a pre-value are yielded once, with their position lists merged.
#[derive(Debug)]
pub struct UnionIterator {
    left: PostingIterator,
    right: PostingIterator,
    left_head: Option<Posting>,
    right_head: Option<Posting>,
}

impl UnionIterator {
    pub fn new(left: PostingIterator, right: PostingIterator) -> UnionIterator {
        UnionIterator {
            left,
            right,
            left_head: None,
            right_head: None,
        }
    }
}

impl Iterator for UnionIterator {
    type Item = Result<Posting>;

    fn next(&mut self) -> Option<Result<Posting>> {
        if self.left_head.is_none() {
            self.left_head = try_or_ret_some_err!(self.left.next().transpose());
        }
        if self.right_head.is_none() {
            self.right_head = try_or_ret_some_err!(self.right.next().transpose());
        }
        match (self.left_head.take(), self.right_head.take()) {
            (None, None) => None,
            (Some(left), None) => Some(Ok(left)),
            (None, Some(right)) => Some(Ok(right)),
            (Some(mut left), Some(right)) => match left.pre.cmp(&right.pre) {
                Ordering::Less => {
                    self.right_head = Some(right);
                    Some(Ok(left))
                }
                Ordering::Greater => {
                    self.left_head = Some(left);
                    Some(Ok(right))
                }
                Ordering::Equal => {
                    left.merge(right);
                    Some(Ok(left))
                }
            },
        }
    }
}

/// Result of a lookup: a lazy sequence of postings ascending by pre-value.
///
/// Iteration is not restartable. Decoding failures surface as `Err` items.
#[derive(Debug, Default)]
pub enum PostingIterator {
    #[default]
    Empty,
    Memory(vec::IntoIter<Posting>),
    Stream(PostingStream),
    Union(Box<UnionIterator>),
}

impl PostingIterator {
    /// Iterator over already decoded postings, which must be ascending by pre-value.
    pub fn from_postings(postings: Vec<Posting>) -> PostingIterator {
        debug_assert!(postings.windows(2).all(|w| w[0].pre < w[1].pre));
        if postings.is_empty() {
            PostingIterator::Empty
        } else {
            PostingIterator::Memory(postings.into_iter())
        }
    }

    /// Returns `true` if the iterator is known to yield nothing without reading storage.
    pub fn is_empty(&self) -> bool {
        matches!(self, PostingIterator::Empty)
    }

    /// Drains the iterator, failing on the first error.
    pub fn collect_postings(self) -> Result<Vec<Posting>> {
        self.collect()
    }
}

impl Iterator for PostingIterator {
    type Item = Result<Posting>;

    fn next(&mut self) -> Option<Result<Posting>> {
        match self {
            PostingIterator::Empty => None,
            PostingIterator::Memory(it) => it.next().map(Ok),
            PostingIterator::Stream(it) => it.next(),
            PostingIterator::Union(it) => it.next(),
        }
    }
}

impl From<PostingStream> for PostingIterator {
    fn from(stream: PostingStream) -> Self {
        PostingIterator::Stream(stream)
    }
}

/// Merges two posting iterators. An empty operand returns the other one unchanged.
pub fn union(left: PostingIterator, right: PostingIterator) -> PostingIterator {
    match (left, right) {
        (PostingIterator::Empty, other) | (other, PostingIterator::Empty) => other,
        (left, right) => PostingIterator::Union(Box::new(UnionIterator::new(left, right))),
    }
}

/// Merges any number of posting iterators as a balanced tree of pairwise unions.
pub fn union_all(iters: impl IntoIterator<Item = PostingIterator>) -> PostingIterator {
    let mut level: Vec<PostingIterator> = iters.into_iter().filter(|it| !it.is_empty()).collect();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut pairs = level.into_iter();
        while let Some(left) = pairs.next() {
            next.push(match pairs.next() {
                Some(right) => union(left, right),
                None => left,
            });
        }
        level = next;
    }
    level.pop().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use byteorder::{BigEndian, WriteBytesExt};

    use super::*;

    fn memory(postings: &[(u32, &[u32])]) -> PostingIterator {
        PostingIterator::from_postings(
            postings
                .iter()
                .map(|&(pre, pos)| Posting::new(pre, pos.to_vec()))
                .collect(),
        )
    }

    fn drain(it: PostingIterator) -> Vec<(u32, Vec<u32>)> {
        it.collect_postings()
            .unwrap()
            .into_iter()
            .map(|p| (p.pre, p.positions))
            .collect()
    }

    fn random_postings(rng: &mut fastrand::Rng) -> Vec<(u32, Vec<u32>)> {
        let mut pre = 0;
        (0..rng.usize(0..20))
            .map(|_| {
                pre += rng.u32(1..4);
                let mut positions: Vec<u32> = (0..rng.usize(1..4)).map(|_| rng.u32(0..10)).collect();
                positions.sort();
                positions.dedup();
                (pre, positions)
            })
            .collect()
    }

    fn as_iter(postings: &[(u32, Vec<u32>)]) -> PostingIterator {
        PostingIterator::from_postings(
            postings
                .iter()
                .map(|(pre, pos)| Posting::new(*pre, pos.clone()))
                .collect(),
        )
    }

    /// Encodes postings in the posting stream layout, preceded by `pad` filler bytes.
    fn encode(pad: usize, postings: &[(u32, &[u32])]) -> Segment {
        let mut buf = vec![0xEE; pad];
        for (pre, _) in postings {
            buf.write_u32::<BigEndian>(*pre).unwrap();
        }
        for (_, positions) in postings {
            buf.write_u32::<BigEndian>(positions.len() as u32).unwrap();
            for &p in positions.iter() {
                buf.write_u32::<BigEndian>(p).unwrap();
            }
        }
        Segment::open("ftxb", Arc::new(buf)).unwrap()
    }

    #[test]
    fn test_merge_positions() {
        let mut p = Posting::new(1, vec![1, 4, 9]);
        p.merge(Posting::new(1, vec![2, 4, 10]));
        assert_eq!(p.positions, [1, 2, 4, 9, 10]);

        let mut fast = Posting::new(1, vec![]);
        fast.merge(Posting::new(1, vec![3]));
        assert_eq!(fast.positions, [3]);
    }

    #[test]
    fn test_union_overlap() {
        let a = memory(&[(1, &[0, 2]), (4, &[1]), (9, &[5])]);
        let b = memory(&[(2, &[3]), (4, &[1, 7]), (10, &[0])]);
        assert_eq!(
            drain(union(a, b)),
            [
                (1, vec![0, 2]),
                (2, vec![3]),
                (4, vec![1, 7]),
                (9, vec![5]),
                (10, vec![0])
            ]
        );
    }

    #[test]
    fn test_union_empty_is_identity() {
        let a = memory(&[(3, &[1])]);
        assert!(matches!(union(PostingIterator::Empty, a), PostingIterator::Memory(_)));
        let b = memory(&[(3, &[1])]);
        assert!(matches!(union(b, PostingIterator::Empty), PostingIterator::Memory(_)));
        assert!(union_all(Vec::new()).is_empty());
    }

    #[test]
    fn test_union_commutative_and_associative() {
        let mut rng = fastrand::Rng::with_seed(5);
        for _ in 0..50 {
            let (a, b, c) = (
                random_postings(&mut rng),
                random_postings(&mut rng),
                random_postings(&mut rng),
            );
            let ab = drain(union(as_iter(&a), as_iter(&b)));
            let ba = drain(union(as_iter(&b), as_iter(&a)));
            assert_eq!(ab, ba);

            let left = drain(union(union(as_iter(&a), as_iter(&b)), as_iter(&c)));
            let right = drain(union(as_iter(&a), union(as_iter(&b), as_iter(&c))));
            assert_eq!(left, right);

            let all = drain(union_all([as_iter(&a), as_iter(&b), as_iter(&c)]));
            assert_eq!(all, left);
        }
    }

    #[test]
    fn test_stream_decodes_postings() {
        let seg = encode(3, &[(2, &[0, 5]), (7, &[1]), (8, &[2, 3, 4])]);
        let stream = PostingStream::new(seg, 3, 3, false);
        assert_eq!(
            drain(stream.into()),
            [(2, vec![0, 5]), (7, vec![1]), (8, vec![2, 3, 4])]
        );
    }

    #[test]
    fn test_stream_spans_pre_batches() {
        let positions: Vec<u32> = vec![1];
        let postings: Vec<(u32, &[u32])> = (0..150).map(|i| (i * 2, positions.as_slice())).collect();
        let seg = encode(0, &postings);
        let decoded = drain(PostingStream::new(seg, 0, 150, false).into());
        assert_eq!(decoded.len(), 150);
        assert_eq!(decoded[149], (298, vec![1]));
    }

    #[test]
    fn test_fast_mode_skips_positions() {
        let seg = encode(0, &[(2, &[0, 5]), (7, &[1])]);
        let stream = PostingStream::new(seg, 0, 2, true);
        assert_eq!(drain(stream.into()), [(2, vec![]), (7, vec![])]);
    }

    #[test]
    fn test_out_of_order_pre_is_error() {
        let seg = encode(0, &[(5, &[0]), (5, &[1])]);
        let mut stream = PostingStream::new(seg, 0, 2, false);
        assert!(stream.next().unwrap().is_ok());
        let err = stream.next().unwrap().unwrap_err();
        assert!(err.is_integrity());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_truncated_stream_is_error() {
        let seg = encode(0, &[(5, &[0])]);
        let stream = PostingStream::new(seg, 0, 4, false);
        assert!(PostingIterator::from(stream).collect_postings().is_err());
    }
}
