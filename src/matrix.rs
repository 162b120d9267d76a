use rand::Rng;

/// Deterministic contents used to initialize a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Every element is 0.0
    Zeros,
    /// Every element is 1.0
    Ones,
    /// Element `[i][j]` is `i + 1.0`, constant across each row
    RowIndex,
}

impl Pattern {
    /// Value of the pattern at `row`, independent of the column.
    pub fn value_at(self, row: usize) -> f32 {
        match self {
            Pattern::Zeros => 0.0,
            Pattern::Ones => 1.0,
            Pattern::RowIndex => row as f32 + 1.0,
        }
    }
}

/// Dense row-major matrix of `f32` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self { rows, cols, data: vec![0.0; rows * cols] }
    }

    pub fn with_pattern(rows: usize, cols: usize, pattern: Pattern) -> Self {
        let mut matrix = Self::zeros(rows, cols);
        matrix.fill(pattern);
        matrix
    }

    /// Builds a matrix from an existing row-major buffer.
    /// Returns `None` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let data = (0..rows * cols).map(|idx| f(idx / cols, idx % cols)).collect();
        Self { rows, cols, data }
    }

    /// Matrix filled with uniform values in `range`.
    pub fn random<R: Rng + ?Sized>(rows: usize, cols: usize, range: std::ops::Range<f32>, rng: &mut R) -> Self {
        let data = (0..rows * cols).map(|_| rng.gen_range(range.clone())).collect();
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Size of the backing storage in bytes.
    pub fn byte_len(&self) -> u64 {
        (self.data.len() * std::mem::size_of::<f32>()) as u64
    }

    /// Overwrites every element with `pattern`.
    pub fn fill(&mut self, pattern: Pattern) {
        for (row, values) in self.data.chunks_mut(self.cols.max(1)).enumerate() {
            values.fill(pattern.value_at(row));
        }
    }
}

/// Resets the benchmark matrices: `a` to ones, `b` to the row-index ramp,
/// both outputs to zero.
pub fn init_matrices(a: &mut Matrix, b: &mut Matrix, c_serial: &mut Matrix, c_parallel: &mut Matrix) {
    a.fill(Pattern::Ones);
    b.fill(Pattern::RowIndex);
    c_serial.fill(Pattern::Zeros);
    c_parallel.fill(Pattern::Zeros);
}

/// Closed-form `Ones * RowIndex` for `n`×`n` operands. Every cell sums the
/// column of the ramp: `C[i][j] = n * (n + 1) / 2`.
pub fn analytic_product(n: usize) -> Matrix {
    let value = (n * (n + 1) / 2) as f32;
    Matrix::from_fn(n, n, |_, _| value)
}

/// Closed-form `RowIndex * Ones` for `n`×`n` operands:
/// `C[i][j] = n * (i + 1)`.
pub fn analytic_product_reversed(n: usize) -> Matrix {
    Matrix::from_fn(n, n, |row, _| n as f32 * (row as f32 + 1.0))
}
