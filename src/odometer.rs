// src/odometer.rs
//
// Mixed-radix counter over a list of (extent, input stride, output stride)
// axes. Yields the pair of linear offsets (input, output) for every point of
// the Cartesian product. The first axis is the outermost loop, the last axis
// varies fastest.
//
// Used by the strided FFT engine (loop dimensions) and by topology resizing
// (copying an index box row by row).

/// Iterator over the (input, output) offsets of a nested strided loop.
#[derive(Debug, Clone)]
pub struct Odometer {
    extents: Vec<usize>,
    in_strides: Vec<usize>,
    out_strides: Vec<usize>,
    digits: Vec<usize>,
    in_offset: usize,
    out_offset: usize,
    remaining: usize,
}

impl Odometer {
    /// `axes` are `(extent, input_stride, output_stride)`, outermost first.
    /// An empty axis list yields exactly one position (the base offsets).
    pub fn new(axes: &[(usize, usize, usize)], in_base: usize, out_base: usize) -> Self {
        let extents: Vec<usize> = axes.iter().map(|a| a.0).collect();
        let remaining = extents.iter().product();
        Self {
            in_strides: axes.iter().map(|a| a.1).collect(),
            out_strides: axes.iter().map(|a| a.2).collect(),
            digits: vec![0; extents.len()],
            extents,
            in_offset: in_base,
            out_offset: out_base,
            remaining,
        }
    }

    /// Number of positions the odometer visits in total.
    pub fn len_total(&self) -> usize {
        self.extents.iter().product()
    }

    fn advance(&mut self) {
        for k in (0..self.digits.len()).rev() {
            self.digits[k] += 1;
            self.in_offset += self.in_strides[k];
            self.out_offset += self.out_strides[k];
            if self.digits[k] < self.extents[k] {
                return;
            }
            // carry
            self.in_offset -= self.extents[k] * self.in_strides[k];
            self.out_offset -= self.extents[k] * self.out_strides[k];
            self.digits[k] = 0;
        }
    }
}

impl Iterator for Odometer {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = (self.in_offset, self.out_offset);
        self.remaining -= 1;
        if self.remaining > 0 {
            self.advance();
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Odometer {}
