pub mod area;
pub mod assigneddataset;
pub mod bbox;
pub mod level;
pub mod note;
pub mod origin;
pub mod product;
pub mod proddef;
pub mod quantity;
pub mod reftime;
pub mod run;
pub mod source;
pub mod task;
pub mod timerange;
pub mod typevalue;

pub use area::{Area, BboxProvider, NoBbox};
pub use assigneddataset::AssignedDataset;
pub use bbox::BBox;
pub use level::Level;
pub use note::Note;
pub use origin::Origin;
pub use proddef::Proddef;
pub use product::Product;
pub use quantity::Quantity;
pub use reftime::Reftime;
pub use run::Run;
pub use source::Source;
pub use task::Task;
pub use timerange::{Timedef, Timerange};
pub use typevalue::TypeValue;
