//! 画面に出す文言

pub const MATCH_PENDING: &str = "Book search pending...";
pub const MATCH_FAILED_PREFIX: &str = "Book search failed: ";
pub const COMMUNICATION_ERROR: &str = "Error communicating with the server.";
pub const FETCH_RESULTS_ERROR: &str = "Error fetching results.";

pub const CONFIRMED_HEADING: &str = "Confirmed Books for analysis:";
pub const NO_BOOKS_ALERT: &str =
    "No books selected to proceed with analysis. Please select at least one match.";
pub const NO_BOOKS_STATUS: &str = "No books selected.";
pub const DETAILS_RECEIVED: &str = "Book details received. Starting background analysis...";
pub const FETCH_BOOK_DATA_ERROR: &str = "Error fetching book data.";

pub const REQUESTING_ANALYSIS: &str = "Requesting background LLM analysis...";
pub const ANALYSIS_STARTED: &str = "Background LLM analysis started... waiting for results.";
pub const NO_ANALYSIS_JOB_ID: &str = "Error: Could not get analysis job ID.";
pub const START_ANALYSIS_ERROR_PREFIX: &str = "Error starting analysis: ";

pub const ANALYSIS_PENDING: &str = "LLM analysis in progress... This may take a minute.";
pub const ANALYSIS_COMPLETE: &str = "Analysis complete!";
pub const ANALYSIS_FAILED_PREFIX: &str = "LLM analysis job failed: ";
pub const ANALYSIS_FAILED_RESULT: &str = "Analysis failed. Please try again.";
pub const ANALYSIS_STATUS_ERROR: &str = "Error checking analysis job status.";

pub const ANALYSED_HEADING: &str = "Analysed Books:";
pub const NO_ANALYSIS_RESULTS: &str = "No analysis results available.";
pub const THEMES_HEADING: &str = "Common Themes (from LLM Analysis):";
pub const NO_COMMON_THEMES: &str = "No significant common themes found across multiple books.";

pub const CANCELLED: &str = "Cancelled.";
