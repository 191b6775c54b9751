//! Pipeline payload - the one piece of data devices pass around
//!
//! A closed sum type: the variant is the type tag, so a payload can never
//! disagree with itself about what it holds. The header tag is kept in
//! sync by [`crate::core::state::PipelineState::set_payload`].

use crate::core::header::LogDim;
use crate::core::tags::PayloadType;
use std::borrow::Cow;

/// Row-major f64 matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(rows * cols, data.len(), "matrix shape mismatch");
        Matrix { rows, cols, data }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Row-major byte matrix (camera frames and the like).
#[derive(Debug, Clone, PartialEq)]
pub struct ByteMatrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl ByteMatrix {
    pub fn new(rows: usize, cols: usize, data: Vec<u8>) -> Self {
        assert_eq!(rows * cols, data.len(), "matrix shape mismatch");
        ByteMatrix { rows, cols, data }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        ByteMatrix {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.data[row * self.cols + col] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// The tagged buffer carried through the pipeline.
///
/// Owned by the pipeline state; a device that wants to reuse an output
/// buffer across iterations keeps its own scratch and swaps it in.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Nothing produced yet.
    Empty,
    /// Flat block of f64 values.
    Block(Vec<f64>),
    /// Vector of f64 values.
    Vector(Vec<f64>),
    /// Row-major f64 matrix.
    Matrix(Matrix),
    /// Flat block of bytes.
    Bytes(Vec<u8>),
    /// Row-major byte matrix.
    ByteMatrix(ByteMatrix),
}

impl Payload {
    /// The type tag matching this variant.
    pub fn type_tag(&self) -> PayloadType {
        match self {
            Payload::Empty => PayloadType::NONE,
            Payload::Block(_) => PayloadType::BLOCK,
            Payload::Vector(_) => PayloadType::VECTOR,
            Payload::Matrix(_) => PayloadType::MATRIX,
            Payload::Bytes(_) => PayloadType::BYTES,
            Payload::ByteMatrix(_) => PayloadType::BYTE_MATRIX,
        }
    }

    /// Natural logical dimensions of this payload.
    pub fn log_dim(&self) -> LogDim {
        match self {
            Payload::Empty => LogDim::default(),
            Payload::Block(b) => LogDim {
                y: b.len() as u64,
                x: 1,
            },
            Payload::Vector(v) => LogDim {
                y: v.len() as u64,
                x: 1,
            },
            Payload::Matrix(m) => LogDim {
                y: m.rows() as u64,
                x: m.cols() as u64,
            },
            Payload::Bytes(b) => LogDim {
                y: b.len() as u64,
                x: 1,
            },
            Payload::ByteMatrix(m) => LogDim {
                y: m.rows() as u64,
                x: m.cols() as u64,
            },
        }
    }

    /// Number of scalar elements in the payload.
    pub fn len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Block(b) => b.len(),
            Payload::Vector(v) => v.len(),
            Payload::Matrix(m) => m.as_slice().len(),
            Payload::Bytes(b) => b.len(),
            Payload::ByteMatrix(m) => m.as_slice().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw record body for sinks: payload bytes in row-major order,
    /// f64 values little-endian. Borrows when the data is already a byte
    /// buffer, copies otherwise.
    pub fn contiguous_bytes(&self) -> Cow<'_, [u8]> {
        fn doubles_to_bytes(values: &[f64]) -> Vec<u8> {
            let mut out = Vec::with_capacity(values.len() * 8);
            for v in values {
                out.extend_from_slice(&v.to_le_bytes());
            }
            out
        }

        match self {
            Payload::Empty => Cow::Borrowed(&[]),
            Payload::Block(b) => Cow::Owned(doubles_to_bytes(b)),
            Payload::Vector(v) => Cow::Owned(doubles_to_bytes(v)),
            Payload::Matrix(m) => Cow::Owned(doubles_to_bytes(m.as_slice())),
            Payload::Bytes(b) => Cow::Borrowed(b),
            Payload::ByteMatrix(m) => Cow::Borrowed(m.as_slice()),
        }
    }
}
