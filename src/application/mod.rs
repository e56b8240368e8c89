// Application layer: DTO mapping and the persistence contracts

pub mod exchange;
pub mod mappers;

pub use exchange::{ExchangeError, GroupExporter, GroupImporter, ModelExporter, ModelImporter};
pub use mappers::{
    ConstantDto, ConstantGroupDto, ConstraintDto, ConstraintGroupDto, ExpressionDto, ModelDocument,
    ModelDto, TermDto, VarDto, VarGroupDto,
};
