use std::fmt;

/// Word-indexed hexadecimal rendering of an instruction stream.
///
/// Each row starts with the 6-wide zero-padded hex index of its first word,
/// followed by up to `cols` tab-separated 8-wide zero-padded hex words.
/// Diagnostic output only, not a wire format.
#[derive(Debug, Clone, Copy)]
pub struct HexDump<'a> {
    words: &'a [u32],
    cols: usize,
}

impl<'a> HexDump<'a> {
    pub fn new(words: &'a [u32]) -> Self {
        Self { words, cols: 4 }
    }

    pub fn with_columns(words: &'a [u32], cols: usize) -> Self {
        assert!(cols >= 1);
        Self { words, cols }
    }
}

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i % self.cols == 0 {
                if i != 0 {
                    f.write_str("\n")?;
                }
                write!(f, "{i:06x}:")?;
            }
            write!(f, "\t{word:08x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_indexed_by_word_position() {
        let words = [0x1, 0x2, 0x3, 0x4, 0xc002_6900];
        let dump = HexDump::with_columns(&words, 4).to_string();
        assert_eq!(
            dump,
            "000000:\t00000001\t00000002\t00000003\t00000004\n000004:\tc0026900"
        );
    }

    #[test]
    fn empty_stream_renders_nothing() {
        assert_eq!(HexDump::new(&[]).to_string(), "");
    }

    #[test]
    fn single_column_layout() {
        let words = [0xdead_beef, 0x10];
        assert_eq!(
            HexDump::with_columns(&words, 1).to_string(),
            "000000:\tdeadbeef\n000001:\t00000010"
        );
    }
}
