mod notion_records;

pub use notion_records::{
    BlockRecord, ListResponse, NotionRecordParser, PageRecord, ParseError, ParseResult,
};
