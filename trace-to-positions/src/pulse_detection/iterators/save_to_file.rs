use super::super::{Real, Temporal};
use std::{
    fs::File,
    io::{BufWriter, Error, Write},
    path::Path,
};

/// Anything that can be written as one line of a CSV file.
pub(crate) trait SavablePoint {
    fn write_to_file<W: Write>(&self, file: &mut W) -> Result<(), Error>;
}

impl<T> SavablePoint for (T, Real)
where
    T: Temporal + std::fmt::Display,
{
    fn write_to_file<W: Write>(&self, file: &mut W) -> Result<(), Error> {
        writeln!(file, "{0},{1}", self.0, self.1)
    }
}

impl<P: SavablePoint> SavablePoint for &P {
    fn write_to_file<W: Write>(&self, file: &mut W) -> Result<(), Error> {
        P::write_to_file(*self, file)
    }
}

pub(crate) trait SaveToFileFilter<I>
where
    I: Iterator,
    I::Item: SavablePoint,
{
    fn save_to_file(self, path: &Path) -> Result<(), Error>;
    fn save_to_writer<W: Write>(self, writer: &mut W) -> Result<(), Error>;
}

impl<I> SaveToFileFilter<I> for I
where
    I: Iterator,
    I::Item: SavablePoint,
{
    fn save_to_file(self, path: &Path) -> Result<(), Error> {
        let mut file = BufWriter::new(File::create(path)?);
        self.save_to_writer(&mut file)?;
        file.flush()
    }

    fn save_to_writer<W: Write>(self, writer: &mut W) -> Result<(), Error> {
        for item in self {
            item.write_to_file(writer)?;
        }
        Ok(())
    }
}
