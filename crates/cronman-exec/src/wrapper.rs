//! Wrapper-script generation for externally tracked cron jobs.
//!
//! The rendered bash script is installed next to the actual cron entries;
//! it times the wrapped command and reports the outcome to the tracking
//! endpoint with the shared API key.

/// Render the cron wrapper script for the given endpoint and key.
pub fn wrapper_script(base_url: &str, api_key: &str) -> String {
    format!(
        r#"#!/bin/bash

# Cron Task Wrapper Script
# Usage: ./cron-wrapper.sh "task-id" "command to execute"

TASK_ID="$1"
COMMAND="$2"
API_URL="{base_url}/api/track-completion"
API_KEY="{api_key}"

if [ -z "$TASK_ID" ] || [ -z "$COMMAND" ]; then
    echo "Usage: $0 <task-id> <command>"
    exit 1
fi

echo "Starting task: $TASK_ID"
echo "Command: $COMMAND"

START_TIME=$(date +%s.%N)

# Execute the command and capture output
OUTPUT=$(eval "$COMMAND" 2>&1)
EXIT_CODE=$?

END_TIME=$(date +%s.%N)
DURATION=$(echo "$END_TIME - $START_TIME" | bc)

# Determine status
if [ $EXIT_CODE -eq 0 ]; then
    STATUS="success"
else
    STATUS="failed"
fi

echo "Task completed with exit code: $EXIT_CODE"
echo "Duration: $DURATION seconds"

# Send tracking data to API
curl -s -X POST "$API_URL" \
    -H "Content-Type: application/json" \
    -H "X-API-Key: $API_KEY" \
    -d "{{
        \"task_id\": \"$TASK_ID\",
        \"command\": \"$COMMAND\",
        \"status\": \"$STATUS\",
        \"exit_code\": $EXIT_CODE,
        \"duration\": $DURATION,
        \"output\": \"$(echo "$OUTPUT" | head -c 1000 | sed 's/"/\\"/g')\"
    }}" >/dev/null 2>&1

exit $EXIT_CODE
"#
    )
}
