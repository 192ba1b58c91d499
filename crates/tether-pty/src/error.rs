#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    #[error("failed to open pty: {0}")]
    Open(#[source] anyhow::Error),

    #[error("failed to spawn shell `{shell}`: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to take pty writer: {0}")]
    Writer(#[source] anyhow::Error),

    #[error("failed to clone pty reader: {0}")]
    Reader(#[source] anyhow::Error),

    #[error("failed to spawn pty reader thread: {0}")]
    Thread(#[source] std::io::Error),
}
