// 領域層：資料模型與 port (介面)，不含 HTTP 或設定相關的程式碼。

pub mod model;
pub mod ports;
