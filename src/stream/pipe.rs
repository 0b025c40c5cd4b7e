use std::io;
use std::path::Path;

use futures::AsyncBufReadExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::errors::FollowError;
use crate::stream::registry::FollowGuard;
use crate::stream::{LogReader, LogSource};
use crate::types::FollowSummary;

/// Copy one container's log into `path` until the remote side closes it.
///
/// Chunks are split on `\n` and written (newline included) as soon as they arrive,
/// with a flush after each, so the file grows while the container runs. A final
/// chunk without a trailing newline is written as received.
///
/// Every exit path drops the stream and the file before `guard`, so the key is only
/// released once both handles are closed.
pub async fn pipe_to_file(
    source: &dyn LogSource,
    guard: FollowGuard,
    path: &Path,
) -> Result<FollowSummary, FollowError> {
    let key = guard.key();
    let target = source.target(&key.pod, &key.container);

    let reader = target.open().await.map_err(FollowError::StreamOpen)?;

    let file = match File::create(path).await {
        Ok(f) => f,
        Err(source) => {
            drop(reader);
            return Err(FollowError::FileCreate {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    tracing::info!(
        namespace = %key.pod.namespace,
        pod = %key.pod.name,
        container = %key.container,
        path = %path.display(),
        "following container log"
    );

    let result = copy_lines(reader, file, path).await;
    drop(guard);
    result
}

async fn copy_lines(
    mut reader: LogReader<'_>,
    mut file: File,
    path: &Path,
) -> Result<FollowSummary, FollowError> {
    let mut summary = FollowSummary::default();
    let mut buf: Vec<u8> = Vec::with_capacity(8 * 1024);

    loop {
        buf.clear();

        let read = reader.read_until(b'\n', &mut buf).await;

        // Bytes taken off the stream before a failure still belong in the file.
        if !buf.is_empty() {
            write_chunk(&mut file, &buf)
                .await
                .map_err(|source| FollowError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
            summary.bytes += buf.len() as u64;
            summary.lines += 1;
        }

        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => return Err(FollowError::Read(e)),
        }
    }

    file.shutdown().await.map_err(|source| FollowError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(summary)
}

async fn write_chunk(file: &mut File, chunk: &[u8]) -> io::Result<()> {
    file.write_all(chunk).await?;
    file.flush().await
}
