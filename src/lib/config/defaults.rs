pub const DEFAULT_PROVIDER_ID: &str = "dashscope";
pub const DEFAULT_ENDPOINT: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_API_PATH: &str = "chat/completions";
pub const DEFAULT_API_KEY_ENV: &str = "QWEN_API_KEY";
pub const DEFAULT_MODEL: &str = "qwen-plus";
pub const DEFAULT_ANALYSIS_MODEL: &str = "qwq-plus";

pub const DEFAULT_FINAL_TOOL: &str = "wb_analysis_tool";
pub const DEFAULT_MAX_TURNS: usize = 16;
pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一个舆情分析助手。当用户要求完成今日的舆情分析时，先调用 start_crawler 工具获取微博舆情数据，再把返回的 result_file_path 作为 csv_file_path 调用 wb_analysis_tool 工具进行分析，最后输出 wb_analysis_tool 返回的舆情简报。";

pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_STARTUP_DELAY_MS: u64 = 1_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_CRAWL_PROJECT_DIR: &str = "weibo-search";
pub const DEFAULT_CRAWL_SETTINGS_FILE: &str = "weibo/settings.py";
pub const DEFAULT_CRAWL_RESULT_FILE: &str = "结果文件/东方精工/东方精工.csv";
pub const DEFAULT_CRAWL_COMMAND: &[&str] = &["scrapy", "crawl", "search"];
pub const DEFAULT_CRAWL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CRAWL_GRACE_SECS: u64 = 5;

pub const DEFAULT_COMPANY: &str = "东方精工";
pub const DEFAULT_MAX_ROWS: usize = 50;
pub const DEFAULT_TEXT_COLUMN: &str = "微博正文";
pub const DEFAULT_ANALYSIS_SYSTEM_PROMPT: &str = "你是一个舆情分析助手";
pub const DEFAULT_CLASSIFIER_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// `{company}` is substituted with the configured company name.
pub const DEFAULT_CLASSIFICATION_PROMPT: &str = r#"你需要检测下面这则来自微博的关于{company}公司的信息（下文用公司指代），做4个二分类任务。类别共有4类，分别是：
1.是否为对公司进行的负面报道、不实报道；
2.是否为社会上存在的已经或将给公司造成不良影响的传言或信息；
3.是否为可能或者已经影响社会公众投资者投资取向，造成公司股价异常波动的信息；
4.是否为涉及公司信息披露且可能对公司股票及其衍生品交易价格产生较大影响的事。
请你按照下面的格式输出结果：
1.是否为对公司进行的负面报道、不实报道：是/否
2.是否为社会上存在的已经或将给公司造成不良影响的传言或信息：是/否
3.是否为可能或者已经影响社会公众投资者投资取向，造成公司股价异常波动的信息：是/否
4.是否为涉及公司信息披露且可能对公司股票及其衍生品交易价格产生较大影响的事：是/否"#;

/// `{company}` is substituted with the configured company name.
pub const DEFAULT_SUMMARY_PROMPT: &str = "我将发送给你一段文字，内容为爬虫收集到的今天的关于{company}这家公司的互联网发言和大模型作出的关于这则发言是否对公司产生影响的判断。你需要总结成一篇300字左右的简报。";
