/*!

# Manual

The dataset holds one record per (election year, state) for the
presidential elections 1948 to 2020, the 50 states and the District of
Columbia. It is assembled from two kinds of sources:

- a tabular file (the MIT Election Data and Science Lab state-level
  president returns, or a file with the same columns) for 1976 onwards;
- the rendered results pages of each election (1948 to 1972), from which
  the per-state results table is extracted.

The command line program `emdata` fetches both, normalizes them into
[`ElectionRecord`](crate::ElectionRecord)s and writes the merged dataset.

## Output

The output is a JSON array, ordered by year then state FIPS code:

```text
[
  {
    "year": 2000,
    "stateFips": "06",
    "stateName": "California",
    "stateAbbr": "CA",
    "electoralVotes": 54,
    "demShare": 0.5345,
    "repShare": 0.4165,
    "otherShare": 0.049,
    "winnerParty": "DEM",
    "winnerName": "Al Gore",
    "runnerUpName": "George W. Bush",
    "demCandidateName": "Al Gore",
    "repCandidateName": "George W. Bush"
  }
]
```

The shares are fractions of the total vote in the state. `otherShare` is
what the two major parties did not get. A share that could not be read is
`null`, and a record with a `null` share is attributed to `OTH`. The
winner is the party strictly ahead of the other major party and not behind
the third parties. Ties go to `OTH`.

## Input formats

### Tabular, wide shape

One row per (year, state), with the shares already computed:

```text
year,state_po,state_fips,office,democratic_percentage,republican_percentage,total_electoral_votes
2000,CA,6,US PRESIDENT,53.45,41.65,54
```

Column names are matched case-insensitively, and several spellings are
accepted for each field (see the `*_FIELDS` constants in
[`tabular`](crate::tabular)). Shares may be percentages (`53.45`) or
fractions (`0.5345`): a value above 1 is divided by 100, a value at or
below 1 is kept as it is. Rows for another office, or for a year before
1976, are dropped.

### Tabular, long shape

The raw MEDSL layout, one row per candidate:

```text
year,state,state_po,state_fips,office,candidate,party_simplified,candidatevotes,totalvotes
2000,CALIFORNIA,CA,6,US PRESIDENT,"GORE, AL",DEMOCRAT,5861203,10965856
```

The rows of a (year, state) are summed. The shares are the Democratic and
Republican candidate votes over `totalvotes` (or over the sum of the
candidate votes when there is no total). A minor-party line of a major
nominee (New York's Working Families or Conservative lines) counts for
that nominee's party. The shape is detected from the
header: a `candidatevotes` column means the long shape.

### Results pages

Only the table that follows the "Results by state" heading is read. When
there is no such heading, or the table after it has no rows, the largest
`wikitable` of the page is used. The
rows of these tables have no dependable headers; values are taken by
shape, as described in [`HeuristicExtractor`](crate::legacy::HeuristicExtractor):

- the state is the first cell token that is a state abbreviation;
- a trailing "Margin" percentage is ignored;
- the two largest percentages are the two major parties;
- the electoral votes are the last small integer of the row.

Known deviations:

- in 1948 and 1968, where a third party carried states, a state won by the
  third party gets shares assigned to the wrong major parties;
- rows spanning several lines (split electors) are read as separate rows.

## Configuration

All keys are optional. The defaults are shown.

```text
{
  "tabular": {
    "url": null,
    "localPath": "data/1976-2020-president.csv",
    "shape": null
  },
  "scraped": {
    "enabled": true,
    "urlTemplate": "https://en.wikipedia.org/wiki/{year}_United_States_presidential_election",
    "firstYear": 1948,
    "lastYear": 1972,
    "pagesDir": null,
    "tableHeading": "Results by state",
    "evCeiling": 100
  },
  "cache": {
    "enabled": true,
    "key": "elections-v1",
    "path": null
  },
  "output": "data/elections.json",
  "collisionPolicy": "fail",
  "requestDelayMs": 700,
  "userAgent": "electoral-map-data/0.1 (presidential results dataset builder)"
}
```

- `tabular.url` is tried first. When it is missing or cannot be read,
  `tabular.localPath` is read instead. `shape` is `"wide"` or `"long"`.
- The results page of each year is fetched from `urlTemplate`, `{year}`
  being replaced. When the fetch fails, `<pagesDir>/<year>.html` is read.
  A year without a page is skipped with a warning.
- `collisionPolicy` is `fail`, `preferTabular` or `preferScraped`. It only
  matters when the year ranges of the sources overlap.
- The cache stores the merged dataset under `key`. Changing the key (or
  passing `--refresh`) rebuilds it. Its default location is
  `<user cache dir>/electoral-map-data/dataset.json`.
- `requestDelayMs` is the pause between two consecutive HTTP requests.

## Command line

```text
emdata --config ingest.json --out data/elections.json
emdata --tabular-local ./1976-2020-president.csv --pages-dir ./pages --no-cache --out -
emdata --config ingest.json --reference data/elections.json
```

The options given on the command line override the configuration file.
`--reference` compares the dataset with an existing file and fails when
they differ. `--verbose` turns on debug logging (`RUST_LOG` is also
respected).

*/
