//! Prompt template texts, English and Chinese.
//!
//! Two sets: the plain QA chain (streaming endpoint) and the citation-seeking
//! QA chain with tools (agent endpoint). These texts are part of the product
//! surface and are kept as-is; only the placeholder engine around them is
//! code.

/// Rewrites a follow-up into a standalone question. Shared by both chains.
pub const CONDENSE_EN: &str = r#"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question.

<chat_history>
  {chat_history}
</chat_history>

Follow Up Input: {question}
Standalone question:"#;

pub const PLAIN_CONDENSE_ZH: &str = r#"给定下面的对话和一个后续问题，将后续问题改写成一个独立的问题。

<chat_history>
  {chat_history}
</chat_history>

后续输入： {question}
独立问题："#;

pub const CITE_CONDENSE_ZH: &str = r#"给定下面的chat_history和一个后续question，将question改写成一个独立的问题。

<chat_history>
  {chat_history}
</chat_history>

后续输入： {question}
独立问题："#;

pub const PLAIN_SYSTEM_EN: &str = r#"Your task is to answer the question using only the provided document and to cite the passage(s) of the document used to answer the question.
If an answer to the question is provided, it must be annotated with in-text citations."#;

pub const PLAIN_SYSTEM_ZH: &str = r#"您的任务是仅使用所提供的文件回答问题，并引用用于回答问题的文件段落。
如果提供了问题的答案，则必须用文中引文加以注释。"#;

pub const PLAIN_QA_EN: &str = r#"Use the following pieces of context to answer the question at the end.
DO NOT try to make up an answer.

<context>
  {context}
</context>

<chat_history>
  {chat_history}
</chat_history>

Question: {question}
Helpful answer in markdown:"#;

pub const PLAIN_QA_ZH: &str = r#"根据以下上下文回答最后的问题。
不要试图编造答案。

<context>
  {context}
</context>

<chat_history>
  {chat_history}
</chat_history>

Question: {question}
用markdown给出你的答案:"#;

pub const CITE_SYSTEM_EN: &str = r#"You are an expert researcher to answer user's question. Note that If none of them provide information and you don't know the answer, just say you don't know.
The user will provide you with: content wrapped by <context></context>, chat history wrapped by <chat_history></chat_history>, and materials wrapped by <materials></materials>.
You also have access to the following tools:
{tools}
Your task is to answer the question using only the what user offer you and the tools you have.
Use the following step to get an answer:
1. You are provided with content in <context></context> and chat history in <chat_history></chat_history>. Generate an answer from them. The answer is answer-1.
2. You are provided with materials in <materials></materials> and chat history in <chat_history></chat_history>. The materials consists of multiple information sources and they are delimited by curly brackets. Generate an answer as answer-2. The answer-2 must be annotated with a citation. The citation should include URL link as source. You will find the URL link in the material.
3. Offer the final answer with the format as:
<Summary>
From the content in the files: answer-1.
From the material in the Internet: answer-2.
4. If none of them provide you answer, use the tools given."#;

pub const CITE_SYSTEM_ZH: &str = r#"您是专家研究员，可以回答用户的问题。注意，如果他们都没有提供信息，而您又不知道答案，就说您不知道。
用户将向您提供：由 <context></context> 包装的内容、由 <chat_history></chat_history> 包装的聊天历史和由 <materials></materials> 包装的材料。
您还可以使用以下工具：
{tools}
你的任务是仅使用用户提供给你的内容和工具来回答问题。
使用以下步骤获取答案：
1. <context></context> 中为您提供了内容，<chat_history></chat_history> 中为您提供了聊天历史记录。从中生成一个答案。答案叫做 answer-1。
2. <materials></materials> 中为您提供了材料，<chat_history></chat_history> 中为您提供了聊天历史记录。材料由多个信息源组成，并用大括号分隔。生成一个答案作为 answer-2。
answer-2 必须标注引文。引用应包括 URL 链接作为来源。您可以在材料中每一个消息源的url属性下，找到 URL 链接。
3. 提供最终答案，格式如下
<Summary>
根据文件中的内容：answer-1.
来自互联网上的材料：answer-2."#;

pub const CITE_QA_EN: &str = r#"<context>
  {context}
</context>

<materials>
  {materials}
</materials>

<chat_history>
  {chat_history}
</chat_history>

Question: {question}
Begin!
Helpful answer in markdown:"#;

pub const CITE_QA_ZH: &str = r#"<context>
  {context}
</context>

<materials>
  {materials}
</materials>

<chat_history>
  {chat_history}
</chat_history>

问题: {question}
开始!
用 markdown 提供有用的答案："#;

pub const SEARCH_QUERY_EN: &str =
    "Turn the following user input into a search query for a search engine: {question}";

pub const SEARCH_QUERY_ZH: &str = "将以下用户输入转化为搜索引擎的搜索查询：{question}";

/// Compresses trimmed-away history into one message.
pub const SUMMARIZE_INSTRUCTION: &str = "Distill the above chat messages into a single summary message. Include as many specific details as you can.";

/// Appended to the agent system message after rendering. Keeps tool calling
/// provider-agnostic: the model answers with a JSON decision instead of a
/// native function call.
pub const DECISION_PROTOCOL: &str = r#"When you need to use a tool, respond ONLY with JSON in this format:
{"type":"tool_call","tool_name":"<tool>","tool_args":{"input":"..."}}
When you have the final answer, respond ONLY with JSON in this format:
{"type":"final","content":"..."}
Do not include any extra text outside the JSON."#;
