/// Position in the record stream, maintained by the record readers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// 1-up record number across all files.
    pub nr: i64,
    /// 1-up record number within the current file.
    pub fnr: i64,
    pub filename: String,
    /// 1-up index of the current file.
    pub filenum: i64,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_for_start_of_file(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
        self.filenum += 1;
        self.fnr = 0;
    }

    pub fn update_for_input_record(&mut self) {
        self.nr += 1;
        self.fnr += 1;
    }
}
