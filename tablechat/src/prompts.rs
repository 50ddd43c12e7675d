//! Prompt text sent to the remote agents and the chat-completion proxy.
//!
//! The wording is part of the external contract: the analyst agents key off
//! these instructions, and the completion prompts pin down the JSON shapes
//! the parsers on our side expect.

/// Instruction asking both analyst agents to test freshly supplied
/// connection details. `extra` carries workflow-specific context such as
/// "New database created with nickname: ..." and may be empty.
pub fn connection_test(details: &str, extra: &str) -> String {
    format!(
        "I have database connection details that I need you to analyze and test. Here are the details:\n\n\
{details}\n\
{extra}\n\n\
Please:\n\
1. Check if all required information is present (host, database, user, password, type, port)\n\
2. If any required information is missing, tell me what's missing\n\
3. If all information is present, try to connect and check for available schemas\n\
4. Respond with one of:\n\
   - \"Missing required information: [list what's missing]\"\n\
   - \"I have tested the connection and it is working. [Then share the database credential as a list nicely formatted: Database Nickname, Host, Database Name, User Name, Type of warehouse - PostGres or MySQL] Available schemas are [share as list]. Let me know your questions.\"\n\
   - \"Connection failed. Please check the following: (1) Ensure all credentials are correct. (2) Verify the user has the necessary access permissions. (3) Confirm there are no firewall or IP restrictions blocking access. (4) Check if the database server is running and accessible. (5) Ensure the database endpoint is correct. Here are the credentials I have tested [formatted as above]\""
    )
}

/// Instruction sharing the schema and sample rows of a freshly uploaded
/// table with the agents that already hold the connection.
pub fn schema_share(table_name: &str, structure_table: &str, sample_data_table: &str) -> String {
    format!(
        "I am sharing the schema and sample data for a file just uploaded by me to the database. \
This is the same database for which I had shared connection details and which you had tested out. \
For all subsequent queries, you must use the same database and connection details.\n\n\
Database Details:\n\
- Already shared with you and tested by you\n\
- Newly uploaded table name: {table_name}\n\n\
Table Structure:\n\
{structure_table}\n\n\
Sample Data (10 rows):\n\
{sample_data_table}\n\n\
Instructions:\n\
1. Study this information on the table just uploaded\n\
2. Confirm that you have studied the schema. Share a few lines of your understanding of the dataset \
and the kind of analysis that can be done, then offer to assist with questions. \
Restrict your initial response to 150 words."
    )
}

/// System prompt for the credential-parsing completion call
pub const CREDENTIAL_PARSER_SYSTEM: &str = "You are a specialized database credentials parser. \
Return only valid JSON without any markdown formatting or additional text.";

/// User prompt turning free-text connection details into the exact
/// credentials JSON `DbCredentials` deserializes.
pub fn credential_parser(connection_text: &str) -> String {
    format!(
        "You are a specialized database credentials parser. Parse the following connection details into a standardized JSON format.\n\n\
Required fields (all must be present, all values strings):\n\
1. host: the database server hostname/IP (lowercase)\n\
2. database: the database name\n\
3. user: the username for authentication (exact case)\n\
4. password: the password for authentication (exact case)\n\
5. schema: the database schema (default to \"public\" if not specified)\n\
6. port: the connection port (PostgreSQL default \"5432\", MySQL default \"3306\")\n\
7. db_type: either \"postgresql\" or \"mysql\" (keywords like postgres/psql mean postgresql, \
mysql/mariadb mean mysql; default to postgresql when unclear)\n\n\
Expected JSON structure:\n\
{{\n\
  \"host\": \"example.host.com\",\n\
  \"database\": \"dbname\",\n\
  \"user\": \"username\",\n\
  \"password\": \"exact_password\",\n\
  \"schema\": \"public\",\n\
  \"port\": \"5432\",\n\
  \"db_type\": \"postgresql\"\n\
}}\n\n\
Input to parse:\n\
{connection_text}\n\n\
Return ONLY the JSON object, no explanations or additional text."
    )
}

/// System prompt for the schema-inference completion call
pub const SCHEMA_ANALYZER_SYSTEM: &str =
    "You are a PostgreSQL schema analyzer that returns only JSON responses.";

/// User prompt asking for column types and descriptions of a file sample
pub fn schema_inference(sample_data: &str, delimiter: char) -> String {
    format!(
        "You are a PostgreSQL schema analyzer. Analyze the provided data sample and determine the appropriate schema.\n\n\
Data sample (delimiter: '{delimiter}'):\n\
{sample_data}\n\n\
Requirements:\n\
1. Use these types only: TEXT, INTEGER, NUMERIC, DATE, TIMESTAMP\n\
2. Ensure column names are SQL-safe (alphanumeric and underscores only)\n\
3. Use INTEGER for whole numbers, NUMERIC for decimals\n\
4. Use DATE for dates, TIMESTAMP for date-times\n\
5. Use TEXT for string data or when unsure\n\
6. Descriptions should be brief but informative\n\n\
Return ONLY a JSON object in this exact format:\n\
{{\n\
  \"columns\": [\n\
    {{\"name\": \"column_name\", \"type\": \"postgresql_type\", \"description\": \"brief description\"}}\n\
  ]\n\
}}"
    )
}
