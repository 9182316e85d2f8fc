//! Items related to the bytecode representation of programs.

use crate::{
    asm::{FromBytesError, Op},
    OpAccess,
};

/// A memory efficient representation of a sequence of operations parsed from bytecode.
///
/// Programs may jump backwards, so operations that have been parsed must be
/// kept around in case they are revisited.
///
/// A `Vec<Op>` would cost the size of the largest variant (`Push(Word)`) for
/// every operation. Instead we store the raw "packed" bytecode alongside a
/// list of indices into the bytecode marking the start of each operation.
#[derive(Clone, Debug, Default)]
pub struct BytecodeMapped {
    /// The bytecode representation of a program's operations.
    bytecode: Vec<u8>,
    /// The index of each op within the bytecode slice.
    ///
    /// Indices are guaranteed to be valid by construction and point to a valid operation.
    map: Vec<usize>,
}

/// A slice into a [`BytecodeMapped`] instance.
#[derive(Clone, Copy, Debug)]
pub struct BytecodeMappedSlice<'a> {
    /// The full bytecode slice from the original `BytecodeMapped`.
    bytecode: &'a [u8],
    /// Some subslice into the `map` of the original `BytecodeMapped`.
    map: &'a [usize],
}

/// A [`BytecodeMapped`] that is populated from a byte iterator as operations
/// are accessed.
///
/// Frames execute account code through this, so bytes past the last
/// operation a frame reaches are never parsed.
#[derive(Clone, Debug)]
pub struct BytecodeMappedLazy<I> {
    mapped: BytecodeMapped,
    iter: I,
}

impl BytecodeMapped {
    /// Push a single operation onto the bytecode mapping.
    pub fn push_op(&mut self, op: Op) {
        self.map.push(self.bytecode.len());
        self.bytecode.extend(op.to_bytes());
    }

    /// The inner slice of bytecode that has been mapped.
    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// The slice of operation indices within the mapped bytecode.
    pub fn map(&self) -> &[usize] {
        &self.map
    }

    /// Slice the op indices from the given index.
    ///
    /// The returned slice represents the remainder of the program from the given op.
    ///
    /// Returns `None` if `start` is out of range of the `map` slice.
    pub fn ops_from(&self, start: usize) -> Option<BytecodeMappedSlice<'_>> {
        Some(BytecodeMappedSlice {
            bytecode: &self.bytecode,
            map: self.map.get(start..)?,
        })
    }

    /// The operation at the given index.
    pub fn op(&self, ix: usize) -> Option<Op> {
        let slice = self.ops_from(ix)?;
        slice.ops().next()
    }

    /// An iterator yielding all mapped operations.
    pub fn ops(&self) -> impl '_ + Iterator<Item = Op> {
        expect_ops_from_indices(&self.bytecode, self.map.iter().copied())
    }
}

impl<'a> BytecodeMappedSlice<'a> {
    /// The slice of operation indices within the mapped bytecode.
    pub fn map(self) -> &'a [usize] {
        self.map
    }

    /// An iterator yielding all mapped operations represented by this slice.
    pub fn ops(self) -> impl 'a + Iterator<Item = Op> {
        expect_ops_from_indices(self.bytecode, self.map.iter().copied())
    }
}

impl<I> BytecodeMappedLazy<I>
where
    I: Iterator<Item = u8>,
{
    /// Lazily map the given bytes.
    pub fn new(bytes: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            mapped: BytecodeMapped::default(),
            iter: bytes.into_iter(),
        }
    }

    /// The operations mapped so far.
    pub fn mapped(&self) -> &BytecodeMapped {
        &self.mapped
    }
}

// Allow for collecting a `BytecodeMapped` from an iterator over `Op`s.
impl FromIterator<Op> for BytecodeMapped {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        let mut mapped = BytecodeMapped::default();
        iter.into_iter().for_each(|op| mapped.push_op(op));
        mapped
    }
}

impl TryFrom<&[u8]> for BytecodeMapped {
    type Error = FromBytesError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        crate::asm::from_bytes(bytes.iter().copied()).collect()
    }
}

// Op access lazily populates operations from the byte iterator as necessary.
impl<I> OpAccess for BytecodeMappedLazy<I>
where
    I: Iterator<Item = u8>,
{
    type Error = FromBytesError;
    fn op_access(&mut self, index: usize) -> Option<Result<Op, Self::Error>> {
        while self.mapped.map().len() <= index {
            match Op::from_bytes(&mut self.iter)? {
                Err(err) => return Some(Err(err)),
                Ok(op) => self.mapped.push_op(op),
            }
        }
        self.mapped.op(index).map(Ok)
    }
}

/// Given a bytecode slice and an operation mapping that is assumed to have been
/// previously validated, produce an iterator yielding all associated operations.
fn expect_ops_from_indices<'a>(
    bytecode: &'a [u8],
    map: impl 'a + IntoIterator<Item = usize>,
) -> impl 'a + Iterator<Item = Op> {
    const EXPECT_MSG: &str = "validated upon construction";
    map.into_iter().map(|ix| {
        let mut bytes = bytecode[ix..].iter().copied();
        Op::from_bytes(&mut bytes)
            .expect(EXPECT_MSG)
            .expect(EXPECT_MSG)
    })
}
