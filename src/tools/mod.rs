pub mod clock;
pub mod executor;
pub mod ocr;
pub mod registry;
pub mod schema;
pub mod scrape;
pub mod search;

use std::sync::Arc;

pub use clock::{Clock, ClockTool, SystemClock};
pub use executor::{DispatchOutcome, ToolExecutor};
pub use ocr::{OcrTool, TextDetector, VisionClient};
pub use registry::{ParamKind, ParamSpec, Tool, ToolRegistry};
pub use schema::plan_schema_json;
pub use scrape::{extract_paragraph_text, HttpPageFetcher, PageFetcher, ScrapeTool};
pub use search::{SearchClient, SearchHit, SearchTool, SerpApiClient, TimeWindow};

pub const CLOCK_TOOL: &str = "get_current_date";
pub const SEARCH_TOOL: &str = "google_search";
pub const SCRAPE_TOOL: &str = "scrape_website";
pub const OCR_TOOL: &str = "extract_text_from_image";

/// 注册四个标准工具；注册顺序即 prompt 中的工具列表顺序
pub fn standard_registry(
    clock: Arc<dyn Clock>,
    search: Arc<dyn SearchClient>,
    fetcher: Arc<dyn PageFetcher>,
    detector: Arc<dyn TextDetector>,
    max_chars: usize,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(ClockTool::new(clock));
    registry.register(OcrTool::new(detector));
    registry.register(SearchTool::new(search));
    registry.register(ScrapeTool::new(fetcher, max_chars));
    registry
}
